use classroom_seed::build_app;
use classroom_seed::core::catalog;
use classroom_seed::core::schema::{CollectionSchema, SchemaField};
use classroom_seed::core::store::{CollectionStore, MemoryStore, SqliteStore};
use classroom_seed::plugins::status::{CollectionState, collection_status, status_report};
use tempfile::tempdir;

#[test]
fn fresh_store_reports_everything_missing() {
    let store = MemoryStore::new();
    let report = status_report(&store).unwrap();
    assert_eq!(report.total_collections, 0);
    assert!(!report.fully_provisioned());
    assert!(
        report
            .builtins
            .iter()
            .all(|s| s.state == CollectionState::Missing && s.id.is_none())
    );
}

#[test]
fn bootstrapped_store_is_fully_provisioned() {
    let tmp = tempdir().unwrap();
    let app = build_app(SqliteStore::open(tmp.path(), "data.db", true).unwrap());
    app.start().unwrap();

    let report = status_report(app.store()).unwrap();
    assert_eq!(report.total_collections, 2);
    assert!(report.fully_provisioned());
    let names: Vec<&str> = report.builtins.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["behaviors", "classes"]);
}

#[test]
fn extra_collections_count_but_do_not_affect_builtins() {
    let store = MemoryStore::new();
    store
        .save_collection(&CollectionSchema::base("students").with_field(SchemaField::text("name")))
        .unwrap();
    store.save_collection(&catalog::behaviors_collection()).unwrap();

    let report = status_report(&store).unwrap();
    assert_eq!(report.total_collections, 2);
    assert_eq!(report.builtins[0].state, CollectionState::Provisioned);
    assert_eq!(report.builtins[1].state, CollectionState::Missing);
}

#[test]
fn drifted_builtin_is_flagged() {
    let store = MemoryStore::new();
    let legacy = CollectionSchema::base("classes").with_field(SchemaField::text("name"));
    store.save_collection(&legacy).unwrap();

    let status = collection_status(&store, &catalog::classes_collection()).unwrap();
    assert_eq!(status.state, CollectionState::Drifted);
    assert!(status.id.is_some());
    assert_eq!(status.state.to_string(), "drifted");
}
