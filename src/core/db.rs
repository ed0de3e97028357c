use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub fn db_connect(db_path: &str) -> Result<Connection, error::SeedError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::SeedError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::SeedError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::SeedError::RusqliteError)?;
    Ok(conn)
}

pub fn store_db_path(root: &Path, db_file: &str) -> PathBuf {
    root.join(db_file)
}

/// Creates the collection registry if it is missing.
pub fn initialize_registry(conn: &Connection) -> Result<(), error::SeedError> {
    conn.execute(schemas::COLLECTIONS_REGISTRY_SCHEMA, [])?;
    Ok(())
}

/// Whether a table (registry or record table) exists in the database.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, error::SeedError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
