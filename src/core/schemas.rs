//! SQLite table definitions for the collection store.
//!
//! The store keeps one database with:
//! 1. `_collections`: the registry of provisioned collection descriptors.
//! 2. One record table per collection, named after the collection.

use crate::core::schema::{CollectionSchema, FieldKind, SchemaField};

pub const DEFAULT_DB_NAME: &str = "data.db";
pub const AUDIT_LOG_NAME: &str = "broker.events.jsonl";

pub const COLLECTIONS_TABLE: &str = "_collections";

pub const COLLECTIONS_REGISTRY_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS _collections (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        type TEXT NOT NULL,
        schema_json TEXT NOT NULL, -- serialized CollectionSchema
        fingerprint TEXT NOT NULL,
        created TEXT NOT NULL
    )
";

/// Column definition for a user field, keyed on its type.
pub fn column_definition(field: &SchemaField) -> String {
    let decl = match &field.kind {
        FieldKind::Number { .. } => "NUMERIC NOT NULL DEFAULT 0",
        FieldKind::Bool => "BOOLEAN NOT NULL DEFAULT FALSE",
        FieldKind::Json { .. } => "JSON DEFAULT NULL",
        FieldKind::Select { max_select, .. } if *max_select > 1 => "JSON DEFAULT NULL",
        FieldKind::Text { .. }
        | FieldKind::Email
        | FieldKind::Url
        | FieldKind::Date
        | FieldKind::Select { .. } => "TEXT NOT NULL DEFAULT ''",
    };
    format!("\"{}\" {}", field.name, decl)
}

/// `CREATE TABLE` for a collection's records. Names are validated identifiers, so quoting
/// only guards against keyword clashes (`type`, `order`, ...).
pub fn record_table_ddl(schema: &CollectionSchema) -> String {
    let mut columns = vec![
        "\"id\" TEXT PRIMARY KEY NOT NULL".to_string(),
        "\"created\" TEXT NOT NULL DEFAULT ''".to_string(),
        "\"updated\" TEXT NOT NULL DEFAULT ''".to_string(),
    ];
    columns.extend(schema.fields.iter().map(column_definition));
    format!(
        "CREATE TABLE \"{}\" (\n        {}\n    )",
        schema.name,
        columns.join(",\n        ")
    )
}
