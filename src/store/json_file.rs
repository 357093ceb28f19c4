use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::logging::LogContext;
use crate::models::Address;
use crate::store::{AddressStore, StoreError};

/// JSON array of address strings at a fixed path.
/// A missing file is an empty set.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.display_path(),
            source,
        }
    }
}

impl AddressStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Address>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                LogContext::new("store", "load")
                    .with_metadata("path", serde_json::json!(self.display_path()))
                    .debug("Wallet file not found, starting with an empty set");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<String> = serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
            path: self.display_path(),
            reason: e.to_string(),
        })?;

        let mut addresses: Vec<Address> = Vec::with_capacity(raw.len());
        for entry in raw {
            let address = Address::parse(&entry).map_err(|e| StoreError::Malformed {
                path: self.display_path(),
                reason: e.to_string(),
            })?;
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }

        Ok(addresses)
    }

    fn save(&self, addresses: &[Address]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(addresses)?;

        // Each writer gets its own sibling temp file; the rename replaces the target atomically
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let prefix = format!(
            ".{}.",
            self.path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default()
        );
        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| self.io_error(e))?;

        file.write_all(content.as_bytes()).map_err(|e| self.io_error(e))?;
        file.write_all(b"\n").map_err(|e| self.io_error(e))?;
        file.as_file().sync_all().map_err(|e| self.io_error(e))?;
        file.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        LogContext::new("store", "save")
            .with_metadata("path", serde_json::json!(self.display_path()))
            .with_metadata("wallet_count", serde_json::json!(addresses.len()))
            .debug("Wallet file written");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.display_path())
    }
}
