//! Collection persistence.
//!
//! [`CollectionStore`] is the persistence API the provisioner consumes. Two
//! implementations ship with the crate:
//! - [`SqliteStore`]: the on-disk store (registry table + one record table per collection)
//! - [`MemoryStore`]: in-process map with the same conflict semantics

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error::SeedError;
use crate::core::schema::CollectionSchema;
use crate::core::schemas;
use crate::core::time;
use rusqlite::{ErrorCode, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const ACTOR: &str = "classroom-seed";

/// A collection as persisted by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCollection {
    pub id: String,
    pub created: String,
    pub fingerprint: String,
    pub schema: CollectionSchema,
}

impl StoredCollection {
    fn from_schema(schema: &CollectionSchema) -> Result<Self, SeedError> {
        Ok(Self {
            id: time::new_collection_id(),
            created: time::now_epoch_z(),
            fingerprint: schema.fingerprint()?,
            schema: schema.clone(),
        })
    }
}

/// Persistence API for collection descriptors.
///
/// Names are unique case-insensitively. Saving a taken name must fail with
/// [`SeedError::CollectionExists`] and leave the stored collection untouched.
pub trait CollectionStore {
    fn save_collection(&self, schema: &CollectionSchema) -> Result<StoredCollection, SeedError>;
    fn find_collection(&self, name: &str) -> Result<Option<StoredCollection>, SeedError>;
    /// All collections ordered by name.
    fn list_collections(&self) -> Result<Vec<StoredCollection>, SeedError>;
}

#[derive(Debug)]
pub struct SqliteStore {
    db_path: PathBuf,
    broker: DbBroker,
}

impl SqliteStore {
    /// Opens (creating if needed) the store under `root`.
    pub fn open(root: &Path, db_file: &str, audit: bool) -> Result<Self, SeedError> {
        fs::create_dir_all(root).map_err(SeedError::IoError)?;
        let broker = if audit {
            DbBroker::new(root)
        } else {
            DbBroker::without_audit()
        };
        let store = Self {
            db_path: db::store_db_path(root, db_file),
            broker,
        };
        store
            .broker
            .with_conn(&store.db_path, ACTOR, "registry.init", db::initialize_registry)
            .map_err(|e| SeedError::DatabaseInitializationError(e.to_string()))?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn broker(&self) -> &DbBroker {
        &self.broker
    }

    /// Whether the record table for `name` exists.
    pub fn has_record_table(&self, name: &str) -> Result<bool, SeedError> {
        self.broker
            .with_conn(&self.db_path, ACTOR, "records.exists", |conn| {
                db::table_exists(conn, name)
            })
    }

    /// Column names of a record table, in declaration order.
    pub fn record_columns(&self, name: &str) -> Result<Vec<String>, SeedError> {
        self.broker
            .with_conn(&self.db_path, ACTOR, "records.columns", |conn| {
                if !db::table_exists(conn, name)? {
                    return Err(SeedError::NotFound(format!("record table '{}'", name)));
                }
                let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
                let cols = stmt
                    .query_map([name], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(cols)
            })
    }
}

fn conflict_or_sqlite(err: rusqlite::Error, name: &str) -> SeedError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err
        && e.code == ErrorCode::ConstraintViolation
    {
        return SeedError::CollectionExists(name.to_string());
    }
    SeedError::RusqliteError(err)
}

type RegistryRow = (String, String, String, String);

fn registry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RegistryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn stored_from_row(row: RegistryRow) -> Result<StoredCollection, SeedError> {
    let (id, created, fingerprint, schema_json) = row;
    Ok(StoredCollection {
        id,
        created,
        fingerprint,
        schema: serde_json::from_str(&schema_json)?,
    })
}

impl CollectionStore for SqliteStore {
    fn save_collection(&self, schema: &CollectionSchema) -> Result<StoredCollection, SeedError> {
        schema.validate()?;
        let stored = StoredCollection::from_schema(schema)?;
        let schema_json = serde_json::to_string(schema)?;

        self.broker
            .with_conn(&self.db_path, ACTOR, "collections.save", |conn| {
                let tx = conn.unchecked_transaction()?;
                let taken: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM _collections WHERE name = ?1",
                    [&schema.name],
                    |row| row.get(0),
                )?;
                if taken > 0 {
                    return Err(SeedError::CollectionExists(schema.name.clone()));
                }
                tx.execute(
                    "INSERT INTO _collections (id, name, type, schema_json, fingerprint, created)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        stored.id,
                        schema.name,
                        schema.kind.to_string(),
                        schema_json,
                        stored.fingerprint,
                        stored.created
                    ],
                )
                .map_err(|e| conflict_or_sqlite(e, &schema.name))?;
                tx.execute(&schemas::record_table_ddl(schema), [])?;
                tx.commit()?;
                Ok(())
            })?;

        Ok(stored)
    }

    fn find_collection(&self, name: &str) -> Result<Option<StoredCollection>, SeedError> {
        let row = self
            .broker
            .with_conn(&self.db_path, ACTOR, "collections.find", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, created, fingerprint, schema_json FROM _collections WHERE name = ?1",
                )?;
                let mut rows = stmt.query_map([name], registry_row)?;
                Ok(rows.next().transpose()?)
            })?;
        row.map(stored_from_row).transpose()
    }

    fn list_collections(&self) -> Result<Vec<StoredCollection>, SeedError> {
        let rows: Vec<RegistryRow> =
            self.broker
                .with_conn(&self.db_path, ACTOR, "collections.list", |conn| {
                    let mut stmt = conn.prepare(
                        "SELECT id, created, fingerprint, schema_json FROM _collections
                         ORDER BY name COLLATE NOCASE",
                    )?;
                    let rows = stmt
                        .query_map([], registry_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(rows)
                })?;
        rows.into_iter().map(stored_from_row).collect()
    }
}

/// In-process store keyed by lowercased collection name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, StoredCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with already persisted collections, kept as they are.
    pub fn seeded(collections: Vec<StoredCollection>) -> Self {
        let map = collections
            .into_iter()
            .map(|c| (c.schema.name.to_lowercase(), c))
            .collect();
        Self {
            collections: Mutex::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredCollection>> {
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CollectionStore for MemoryStore {
    fn save_collection(&self, schema: &CollectionSchema) -> Result<StoredCollection, SeedError> {
        schema.validate()?;
        let key = schema.name.to_lowercase();
        let mut collections = self.lock();
        if collections.contains_key(&key) {
            return Err(SeedError::CollectionExists(schema.name.clone()));
        }
        let stored = StoredCollection::from_schema(schema)?;
        collections.insert(key, stored.clone());
        Ok(stored)
    }

    fn find_collection(&self, name: &str) -> Result<Option<StoredCollection>, SeedError> {
        Ok(self.lock().get(&name.to_lowercase()).cloned())
    }

    fn list_collections(&self) -> Result<Vec<StoredCollection>, SeedError> {
        Ok(self.lock().values().cloned().collect())
    }
}
