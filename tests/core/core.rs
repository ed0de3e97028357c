use classroom_seed::build_app;
use classroom_seed::core::broker;
use classroom_seed::core::catalog;
use classroom_seed::core::error::SeedError;
use classroom_seed::core::provision::{self, EntryStatus, ProvisionOutcome};
use classroom_seed::core::schema::{CollectionSchema, FieldKind, FieldType, SchemaField};
use classroom_seed::core::schemas;
use classroom_seed::core::store::{CollectionStore, SqliteStore, StoredCollection};
use rusqlite::Connection;
use std::io;
use tempfile::tempdir;

fn open(dir: &std::path::Path) -> SqliteStore {
    SqliteStore::open(dir, schemas::DEFAULT_DB_NAME, true).expect("open store")
}

#[test]
fn fresh_store_provisions_behaviors_with_four_fields() {
    let tmp = tempdir().unwrap();
    let store = open(tmp.path());

    let outcome = provision::ensure_collection(&store, &catalog::behaviors_collection()).unwrap();
    assert_eq!(outcome, ProvisionOutcome::Created);

    // Read back through a fresh handle so the check goes through the database.
    let reopened = open(tmp.path());
    let stored = reopened
        .find_collection("behaviors")
        .unwrap()
        .expect("behaviors persisted");
    let fields: Vec<(&str, FieldType, bool)> = stored
        .schema
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.field_type(), f.required))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("label", FieldType::Text, true),
            ("pts", FieldType::Number, true),
            ("type", FieldType::Select, true),
            ("icon", FieldType::Text, false),
        ]
    );
    match &stored.schema.field("type").unwrap().kind {
        FieldKind::Select { max_select, values } => {
            assert_eq!(*max_select, 1);
            assert_eq!(values, &vec!["wow".to_string(), "nono".to_string()]);
        }
        other => panic!("type should be a select, got {other:?}"),
    }
    assert!(stored.id.starts_with("pbc_"));
    assert_eq!(
        stored.fingerprint,
        catalog::behaviors_collection().fingerprint().unwrap()
    );
}

#[test]
fn provisioning_twice_creates_no_duplicate() {
    let tmp = tempdir().unwrap();
    let store = open(tmp.path());

    let first = provision::provision_all(&store, &catalog::default_collections());
    assert_eq!(first.count(EntryStatus::Created), 2);

    let second = provision::provision_all(&store, &catalog::default_collections());
    assert_eq!(second.count(EntryStatus::Exists), 2);
    assert!(!second.has_failures());

    let names: Vec<String> = store
        .list_collections()
        .unwrap()
        .into_iter()
        .map(|c| c.schema.name)
        .collect();
    assert_eq!(names, vec!["behaviors", "classes"]);

    let events = broker::read_audit_log(store.broker().audit_log_path().unwrap()).unwrap();
    let conflicts = events
        .iter()
        .filter(|e| e.op == "collections.save" && e.status == "conflict")
        .count();
    assert_eq!(conflicts, 2);
}

#[test]
fn existing_classes_only_warns_and_startup_completes() {
    let tmp = tempdir().unwrap();
    let store = open(tmp.path());
    store.save_collection(&catalog::classes_collection()).unwrap();

    let app = build_app(open(tmp.path()));
    let startup = app.start().expect("startup must complete");
    let report = &startup.reports[0];
    assert_eq!(report.entry("behaviors").unwrap().status, EntryStatus::Created);
    assert_eq!(report.entry("classes").unwrap().status, EntryStatus::Exists);
    assert_eq!(
        startup.warnings(),
        vec!["classes collection may already exist".to_string()]
    );
}

#[test]
fn conflicts_ignore_case() {
    let tmp = tempdir().unwrap();
    let store = open(tmp.path());
    store.save_collection(&catalog::classes_collection()).unwrap();

    let mut upper = catalog::classes_collection();
    upper.name = "Classes".to_string();
    let err = store.save_collection(&upper).unwrap_err();
    assert!(err.is_conflict(), "{err}");
    assert_eq!(store.list_collections().unwrap().len(), 1);
}

#[test]
fn record_table_carries_system_and_field_columns() {
    let tmp = tempdir().unwrap();
    let store = open(tmp.path());
    provision::provision_all(&store, &catalog::default_collections());

    assert!(store.has_record_table("behaviors").unwrap());
    assert_eq!(
        store.record_columns("classes").unwrap(),
        vec!["id", "created", "updated", "name", "teacher", "students", "tasks"]
    );

    let conn = Connection::open(store.db_path()).unwrap();
    conn.execute(
        "INSERT INTO behaviors (id, label, pts, type) VALUES ('r1', 'Helping', 1, 'wow')",
        [],
    )
    .unwrap();
    let icon: String = conn
        .query_row("SELECT icon FROM behaviors WHERE id = 'r1'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(icon, "");
}

#[test]
fn drifted_collection_is_left_untouched() {
    let tmp = tempdir().unwrap();
    let store = open(tmp.path());
    let legacy = CollectionSchema::base("classes")
        .with_field(SchemaField::text("name").required())
        .with_field(SchemaField::json("students"));
    let before = store.save_collection(&legacy).unwrap();

    let outcome = provision::ensure_collection(&store, &catalog::classes_collection()).unwrap();
    assert_eq!(outcome, ProvisionOutcome::AlreadyExists { drift: true });

    let after = store.find_collection("classes").unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(
        store.record_columns("classes").unwrap(),
        vec!["id", "created", "updated", "name", "students"]
    );
}

#[test]
fn failed_table_creation_rolls_back_registration() {
    let tmp = tempdir().unwrap();
    let store = open(tmp.path());
    let conn = Connection::open(store.db_path()).unwrap();
    conn.execute("CREATE TABLE classes (legacy TEXT)", []).unwrap();
    drop(conn);

    let err = store
        .save_collection(&catalog::classes_collection())
        .unwrap_err();
    assert!(!err.is_conflict());
    assert!(matches!(err, SeedError::RusqliteError(_)));
    assert!(store.find_collection("classes").unwrap().is_none());

    let report = provision::provision_all(&store, &catalog::default_collections());
    assert_eq!(report.entry("classes").unwrap().status, EntryStatus::Failed);
    assert_eq!(report.entry("behaviors").unwrap().status, EntryStatus::Created);
}

#[test]
fn audit_can_be_disabled() {
    let tmp = tempdir().unwrap();
    let store = SqliteStore::open(tmp.path(), "school.db", false).unwrap();
    provision::provision_all(&store, &catalog::default_collections());
    assert!(store.broker().audit_log_path().is_none());
    assert!(!tmp.path().join(schemas::AUDIT_LOG_NAME).exists());
    assert!(tmp.path().join("school.db").exists());
}

/// Store whose every write fails with something other than a conflict.
struct BrokenStore;

impl CollectionStore for BrokenStore {
    fn save_collection(&self, _: &CollectionSchema) -> Result<StoredCollection, SeedError> {
        Err(SeedError::IoError(io::Error::other("disk unavailable")))
    }

    fn find_collection(&self, _: &str) -> Result<Option<StoredCollection>, SeedError> {
        Ok(None)
    }

    fn list_collections(&self) -> Result<Vec<StoredCollection>, SeedError> {
        Ok(Vec::new())
    }
}

#[test]
fn startup_completes_when_the_store_is_broken() {
    let app = build_app(BrokenStore);
    let startup = app.start().expect("provisioning failures are not fatal");
    let report = &startup.reports[0];
    assert_eq!(report.count(EntryStatus::Failed), 2);
    assert!(
        report.entries[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("disk unavailable")
    );
    assert_eq!(startup.warnings().len(), 2);
}
