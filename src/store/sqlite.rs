use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::models::Address;
use crate::store::schema::initialize_schema;
use crate::store::{AddressStore, StoreError};

/// Tracked addresses in a SQLite table; `save` rewrites it in one transaction
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: String,
}

impl SqliteStore {
    pub fn new(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: db_path.to_string(),
        })
    }

    /// Create an in-memory database for testing
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: ":memory:".to_string(),
        })
    }
}

impl AddressStore for SqliteStore {
    fn load(&self) -> Result<Vec<Address>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Operation("Failed to acquire lock".to_string()))?;

        let mut stmt = conn.prepare("SELECT address FROM tracked_addresses ORDER BY position")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut addresses = Vec::new();
        for row in rows {
            let raw = row?;
            let address = Address::parse(&raw).map_err(|e| StoreError::Malformed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
            addresses.push(address);
        }

        Ok(addresses)
    }

    fn save(&self, addresses: &[Address]) -> Result<(), StoreError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Operation("Failed to acquire lock".to_string()))?;

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tracked_addresses", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO tracked_addresses (position, address) VALUES (?1, ?2)",
            )?;
            for (position, address) in addresses.iter().enumerate() {
                insert.execute(params![position as i64, address.as_str()])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}
