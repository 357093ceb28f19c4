pub mod json_file;
pub mod memory;
pub mod schema;
pub mod sqlite;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use thiserror::Error;

use crate::config::StoreConfig;
use crate::models::Address;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Wallet store I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Wallet store {path} is malformed: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Wallet database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Wallet store operation failed: {0}")]
    Operation(String),

    #[error("Unknown wallet store backend: {0}")]
    UnknownBackend(String),
}

/// Persistent set of tracked wallet addresses.
///
/// `load` and `save` are each atomic: a reader never observes a partially
/// written set. Implementations keep addresses in canonical form and preserve
/// insertion order.
pub trait AddressStore: Send + Sync {
    fn load(&self) -> Result<Vec<Address>, StoreError>;

    /// Replace the whole set
    fn save(&self, addresses: &[Address]) -> Result<(), StoreError>;

    /// Human-readable location, used in logs
    fn describe(&self) -> String;
}

/// Open the backend named in the config
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn AddressStore>, StoreError> {
    match config.backend.as_str() {
        "json" => Ok(Arc::new(JsonFileStore::new(&config.path))),
        "sqlite" => Ok(Arc::new(SqliteStore::new(&config.path)?)),
        other => Err(StoreError::UnknownBackend(other.to_string())),
    }
}
