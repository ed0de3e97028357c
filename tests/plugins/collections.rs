use classroom_seed::core::catalog;
use classroom_seed::core::error::SeedError;
use classroom_seed::core::provision::{self, EntryStatus};
use classroom_seed::core::store::{CollectionStore, MemoryStore, SqliteStore};
use classroom_seed::plugins::collections::{
    export_collections, import_collections, read_import, write_export,
};
use std::fs;
use tempfile::tempdir;

#[test]
fn export_then_import_into_fresh_store_keeps_fingerprints() {
    let tmp = tempdir().unwrap();
    let source = SqliteStore::open(&tmp.path().join("source"), "data.db", false).unwrap();
    provision::provision_all(&source, &catalog::default_collections());

    let file = tmp.path().join("exports").join("schema.json");
    assert_eq!(write_export(&source, &file).unwrap(), 2);

    let target = SqliteStore::open(&tmp.path().join("target"), "data.db", false).unwrap();
    let report = import_collections(&target, &file).unwrap();
    assert_eq!(report.count(EntryStatus::Created), 2);

    let fingerprints = |store: &dyn CollectionStore| -> Vec<String> {
        store
            .list_collections()
            .unwrap()
            .into_iter()
            .map(|c| c.fingerprint)
            .collect()
    };
    assert_eq!(fingerprints(&source), fingerprints(&target));
}

#[test]
fn import_over_existing_collections_only_warns() {
    let tmp = tempdir().unwrap();
    let store = MemoryStore::new();
    provision::provision_all(&store, &catalog::default_collections());
    let file = tmp.path().join("schema.json");
    write_export(&store, &file).unwrap();

    let report = import_collections(&store, &file).unwrap();
    assert_eq!(report.count(EntryStatus::Exists), 2);
    assert_eq!(report.warnings().len(), 2);
    assert_eq!(store.len(), 2);
}

#[test]
fn import_accepts_hand_written_files_without_ids() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("setup.json");
    fs::write(
        &file,
        r#"[
            {
                "name": "behaviors",
                "type": "base",
                "createRule": null,
                "fields": [
                    {"name": "label", "type": "text", "required": true},
                    {"name": "pts", "type": "number", "required": true},
                    {"name": "type", "type": "select", "required": true, "maxSelect": 1, "values": ["wow", "nono"]},
                    {"name": "icon", "type": "text"}
                ]
            }
        ]"#,
    )
    .unwrap();

    let schemas = read_import(&file).unwrap();
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0], catalog::behaviors_collection());
}

#[test]
fn malformed_or_missing_import_is_an_error() {
    let tmp = tempdir().unwrap();
    let store = MemoryStore::new();

    let missing = import_collections(&store, &tmp.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, SeedError::NotFound(_)));

    let bad = tmp.path().join("bad.json");
    fs::write(&bad, "{ not json").unwrap();
    let err = import_collections(&store, &bad).unwrap_err();
    assert!(matches!(err, SeedError::JsonError(_)));
    assert!(store.is_empty());
}

#[test]
fn export_of_empty_store_is_empty() {
    let store = MemoryStore::new();
    assert!(export_collections(&store).unwrap().is_empty());
}
