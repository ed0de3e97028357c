use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Single entry point for store access: serializes connections in-process and
/// appends one audit line per operation.
#[derive(Debug, Clone)]
pub struct DbBroker {
    audit_log_path: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    /// `success`, `conflict` or `error`.
    pub status: String,
}

impl DbBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            audit_log_path: Some(root.join(schemas::AUDIT_LOG_NAME)),
        }
    }

    pub fn without_audit() -> Self {
        Self {
            audit_log_path: None,
        }
    }

    pub fn audit_log_path(&self) -> Option<&Path> {
        self.audit_log_path.as_deref()
    }

    /// Execute a closure with a serialized connection to the specified DB.
    pub fn with_conn<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, error::SeedError>
    where
        F: FnOnce(&Connection) -> Result<R, error::SeedError>,
    {
        static DB_LOCK: Mutex<()> = Mutex::new(());
        let _lock = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let db_id = db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let result = db::db_connect(&db_path.to_string_lossy()).and_then(|conn| f(&conn));

        let status = match &result {
            Ok(_) => "success",
            Err(e) if e.is_conflict() => "conflict",
            Err(_) => "error",
        };
        self.log_event(actor, op_name, &db_id, status)?;

        result
    }

    fn log_event(
        &self,
        actor: &str,
        op: &str,
        db_id: &str,
        status: &str,
    ) -> Result<(), error::SeedError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let Some(path) = &self.audit_log_path else {
            return Ok(());
        };

        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            actor: actor.to_string(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(error::SeedError::IoError)?;

        writeln!(f, "{}", serde_json::to_string(&ev)?).map_err(error::SeedError::IoError)?;
        Ok(())
    }
}

/// Reads the audit trail back, oldest first.
pub fn read_audit_log(path: &Path) -> Result<Vec<BrokerEvent>, error::SeedError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(error::SeedError::from))
        .collect()
}
