use rusqlite::{Connection, Result};

/// Initialize the wallet store schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tracked_addresses (
            position INTEGER PRIMARY KEY,
            address TEXT NOT NULL UNIQUE CHECK (length(address) = 42),
            added_at INTEGER DEFAULT (strftime('%s', 'now'))
        )",
        [],
    )?;

    Ok(())
}
