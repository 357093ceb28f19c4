use std::sync::Mutex;

use crate::models::Address;
use crate::store::{AddressStore, StoreError};

/// Volatile store for tests and dry runs
#[derive(Default)]
pub struct InMemoryStore {
    addresses: Mutex<Vec<Address>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_addresses(addresses: Vec<Address>) -> Self {
        Self {
            addresses: Mutex::new(addresses),
        }
    }
}

impl AddressStore for InMemoryStore {
    fn load(&self) -> Result<Vec<Address>, StoreError> {
        let addresses = self
            .addresses
            .lock()
            .map_err(|_| StoreError::Operation("Failed to acquire lock".to_string()))?;
        Ok(addresses.clone())
    }

    fn save(&self, addresses: &[Address]) -> Result<(), StoreError> {
        let mut stored = self
            .addresses
            .lock()
            .map_err(|_| StoreError::Operation("Failed to acquire lock".to_string()))?;
        *stored = addresses.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
