//! Idempotent collection provisioning.
//!
//! [`ensure_collection`] attempts to create one collection and folds the store's
//! "already exists" conflict into a successful [`ProvisionOutcome::AlreadyExists`].
//! [`provision_all`] runs it over a list of descriptors on a log-and-continue basis:
//! no entry can stop the ones after it, and the caller always gets a report.

use crate::core::error::SeedError;
use crate::core::output;
use crate::core::schema::CollectionSchema;
use crate::core::store::CollectionStore;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created,
    /// The name was taken. `drift` is set when the stored descriptor differs from the
    /// one that tried to provision it; the stored one is left as is.
    AlreadyExists { drift: bool },
}

pub fn ensure_collection(
    store: &dyn CollectionStore,
    schema: &CollectionSchema,
) -> Result<ProvisionOutcome, SeedError> {
    schema.validate()?;

    match store.save_collection(schema) {
        Ok(stored) => {
            tracing::info!(
                collection = %schema.name,
                id = %stored.id,
                fields = schema.fields.len(),
                "created collection"
            );
            Ok(ProvisionOutcome::Created)
        }
        Err(err) if err.is_conflict() => {
            let drift = match store.find_collection(&schema.name)? {
                Some(existing) => {
                    // Names match case-insensitively; compare under the stored spelling.
                    let mut wanted = schema.clone();
                    wanted.name = existing.schema.name.clone();
                    existing.fingerprint != wanted.fingerprint()?
                }
                None => false,
            };
            if drift {
                tracing::warn!(
                    collection = %schema.name,
                    "collection already exists with a different schema; leaving it unchanged"
                );
            } else {
                tracing::warn!(collection = %schema.name, "collection already exists");
            }
            Ok(ProvisionOutcome::AlreadyExists { drift })
        }
        Err(err) => Err(err),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Created,
    Exists,
    Drifted,
    Failed,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryStatus::Created => "created",
            EntryStatus::Exists => "exists",
            EntryStatus::Drifted => "drifted",
            EntryStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionEntry {
    pub collection: String,
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProvisionEntry {
    /// Warning text for non-created entries.
    pub fn warning(&self) -> Option<String> {
        match self.status {
            EntryStatus::Created => None,
            EntryStatus::Exists => Some(format!(
                "{} collection may already exist",
                self.collection
            )),
            EntryStatus::Drifted => Some(format!(
                "{} collection already exists with a different schema",
                self.collection
            )),
            EntryStatus::Failed => Some(format!(
                "{} collection was not provisioned: {}",
                self.collection,
                output::compact_line(self.detail.as_deref().unwrap_or("unknown error"), 200)
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub entries: Vec<ProvisionEntry>,
}

impl ProvisionReport {
    pub fn entry(&self, collection: &str) -> Option<&ProvisionEntry> {
        self.entries.iter().find(|e| e.collection == collection)
    }

    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.entries.iter().filter_map(|e| e.warning()).collect()
    }

    pub fn has_failures(&self) -> bool {
        self.count(EntryStatus::Failed) > 0
    }
}

/// Provisions each schema in order. Never fails; every outcome lands in the report.
pub fn provision_all(store: &dyn CollectionStore, schemas: &[CollectionSchema]) -> ProvisionReport {
    let mut report = ProvisionReport::default();
    for schema in schemas {
        let entry = match ensure_collection(store, schema) {
            Ok(ProvisionOutcome::Created) => ProvisionEntry {
                collection: schema.name.clone(),
                status: EntryStatus::Created,
                detail: None,
            },
            Ok(ProvisionOutcome::AlreadyExists { drift: false }) => ProvisionEntry {
                collection: schema.name.clone(),
                status: EntryStatus::Exists,
                detail: None,
            },
            Ok(ProvisionOutcome::AlreadyExists { drift: true }) => ProvisionEntry {
                collection: schema.name.clone(),
                status: EntryStatus::Drifted,
                detail: None,
            },
            Err(err) => {
                tracing::warn!(collection = %schema.name, error = %err, "provisioning failed");
                ProvisionEntry {
                    collection: schema.name.clone(),
                    status: EntryStatus::Failed,
                    detail: Some(err.to_string()),
                }
            }
        };
        report.entries.push(entry);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog;
    use crate::core::schema::SchemaField;
    use crate::core::store::MemoryStore;

    #[test]
    fn second_ensure_is_already_exists() {
        let store = MemoryStore::new();
        let schema = catalog::behaviors_collection();
        assert_eq!(
            ensure_collection(&store, &schema).unwrap(),
            ProvisionOutcome::Created
        );
        assert_eq!(
            ensure_collection(&store, &schema).unwrap(),
            ProvisionOutcome::AlreadyExists { drift: false }
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn drift_is_detected_without_touching_the_store() {
        let store = MemoryStore::new();
        let old = CollectionSchema::base("classes").with_field(SchemaField::text("name"));
        store.save_collection(&old).unwrap();
        let before = store.find_collection("classes").unwrap().unwrap();

        let outcome = ensure_collection(&store, &catalog::classes_collection()).unwrap();
        assert_eq!(outcome, ProvisionOutcome::AlreadyExists { drift: true });
        assert_eq!(store.find_collection("classes").unwrap().unwrap(), before);
    }

    #[test]
    fn name_case_alone_is_not_drift() {
        let store = MemoryStore::new();
        store.save_collection(&catalog::classes_collection()).unwrap();
        let mut shouting = catalog::classes_collection();
        shouting.name = "Classes".to_string();
        assert_eq!(
            ensure_collection(&store, &shouting).unwrap(),
            ProvisionOutcome::AlreadyExists { drift: false }
        );
    }

    #[test]
    fn invalid_schema_is_an_error() {
        let store = MemoryStore::new();
        let err = ensure_collection(&store, &CollectionSchema::base("")).unwrap_err();
        assert!(matches!(err, SeedError::ValidationError(_)));
    }

    #[test]
    fn provision_all_keeps_going_after_a_failure() {
        let store = MemoryStore::new();
        let schemas = vec![
            CollectionSchema::base("bad name"),
            catalog::behaviors_collection(),
        ];
        let report = provision_all(&store, &schemas);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].status, EntryStatus::Failed);
        assert_eq!(report.entries[1].status, EntryStatus::Created);
        assert!(report.has_failures());
        let warnings = report.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("bad name collection was not provisioned"));
    }

    #[test]
    fn report_serializes_lowercase_status() {
        let report = ProvisionReport {
            entries: vec![ProvisionEntry {
                collection: "classes".into(),
                status: EntryStatus::Exists,
                detail: None,
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["status"], "exists");
        assert!(json["entries"][0].get("detail").is_none());
    }
}
