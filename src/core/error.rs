use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to initialize database: {0}")]
    DatabaseInitializationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Collection already exists: {0}")]
    CollectionExists(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl SeedError {
    /// True for the provisioning conflict (collection name already registered).
    pub fn is_conflict(&self) -> bool {
        matches!(self, SeedError::CollectionExists(_))
    }
}
