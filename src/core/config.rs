//! Runtime configuration.
//!
//! Resolution order, later wins:
//! 1. built-in defaults
//! 2. `<data dir>/classroom-seed.toml` (missing file is not an error)
//! 3. `CLASSROOM_SEED_LOG` for the log level
//!
//! The data directory itself comes from `--dir`, then `CLASSROOM_SEED_DIR`, then
//! `./pb_data`.

use crate::core::error::SeedError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "classroom-seed.toml";
pub const DIR_ENV: &str = "CLASSROOM_SEED_DIR";
pub const LOG_ENV: &str = "CLASSROOM_SEED_LOG";
pub const DEFAULT_DATA_DIR: &str = "pb_data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `tracing` filter directive, e.g. `info` or `classroom_seed=debug`.
    pub level: String,
    /// `compact` or `json`.
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    pub db_file: String,
    /// Append broker operations to `broker.events.jsonl`.
    pub audit: bool,
    pub log: LogConfig,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            db_file: schemas::DEFAULT_DB_NAME.to_string(),
            audit: true,
            log: LogConfig::default(),
        }
    }
}

impl SeedConfig {
    fn validate(&self) -> Result<(), SeedError> {
        if self.db_file.trim().is_empty()
            || Path::new(&self.db_file).components().count() != 1
        {
            return Err(SeedError::ConfigError(format!(
                "db_file must be a plain file name (got '{}')",
                self.db_file
            )));
        }
        match self.log.format.as_str() {
            "compact" | "json" => Ok(()),
            other => Err(SeedError::ConfigError(format!(
                "log.format must be 'compact' or 'json' (got '{}')",
                other
            ))),
        }
    }
}

/// Picks the data directory: explicit flag, then env, then `./pb_data`.
pub fn resolve_data_dir(flag: Option<PathBuf>, cwd: &Path) -> PathBuf {
    let dir = flag
        .or_else(|| {
            std::env::var(DIR_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    if dir.is_absolute() { dir } else { cwd.join(dir) }
}

/// Parses a config document and applies env overrides.
pub fn parse_config(content: &str, log_override: Option<String>) -> Result<SeedConfig, SeedError> {
    let mut config: SeedConfig =
        toml::from_str(content).map_err(|e| SeedError::ConfigError(e.to_string()))?;
    if let Some(level) = log_override.filter(|l| !l.trim().is_empty()) {
        config.log.level = level;
    }
    config.validate()?;
    Ok(config)
}

/// Loads `<data_dir>/classroom-seed.toml`, falling back to defaults when absent.
pub fn load_config(data_dir: &Path) -> Result<SeedConfig, SeedError> {
    let path = data_dir.join(CONFIG_FILE_NAME);
    let content = if path.exists() {
        fs::read_to_string(&path).map_err(SeedError::IoError)?
    } else {
        String::new()
    };
    parse_config(&content, std::env::var(LOG_ENV).ok())
}

/// Writes a config file with default values unless one exists. Returns whether it wrote.
pub fn write_default_config(data_dir: &Path) -> Result<bool, SeedError> {
    let path = data_dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Ok(false);
    }
    fs::create_dir_all(data_dir).map_err(SeedError::IoError)?;
    let body =
        toml::to_string(&SeedConfig::default()).map_err(|e| SeedError::ConfigError(e.to_string()))?;
    fs::write(&path, body).map_err(SeedError::IoError)?;
    Ok(true)
}
