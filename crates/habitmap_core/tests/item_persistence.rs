use chrono::{TimeZone, Utc};
use habitmap_core::db::{open_db, open_db_in_memory};
use habitmap_core::{
    DiscardReason, Item, ItemPersistence, KeyValueStore, ListVariant, LoadStatus,
    PersistenceError, RepoError, RepoResult, SqliteKeyValueStore,
};

#[test]
fn save_then_load_round_trips_in_order() {
    let conn = open_db_in_memory().unwrap();
    let persistence = ItemPersistence::new(SqliteKeyValueStore::new(&conn), ListVariant::Tasks);
    let items = vec![
        Item::new("Read", Some(Utc.with_ymd_and_hms(2024, 5, 8, 9, 0, 0).unwrap())),
        Item::new("", Some(Utc.with_ymd_and_hms(2024, 5, 8, 23, 30, 0).unwrap())),
        Item::new("Run", Some(Utc::now())),
    ];

    persistence.save(&items).unwrap();
    let report = persistence.load_report();

    assert_eq!(report.items, items);
    assert_eq!(report.status, LoadStatus::Restored { count: 3 });
}

#[test]
fn empty_list_round_trips() {
    let conn = open_db_in_memory().unwrap();
    let persistence = ItemPersistence::new(SqliteKeyValueStore::new(&conn), ListVariant::Habits);

    persistence.save(&[]).unwrap();

    assert_eq!(
        persistence.load_report().status,
        LoadStatus::Restored { count: 0 }
    );
}

#[test]
fn cold_start_returns_empty_list_without_error() {
    let conn = open_db_in_memory().unwrap();
    let persistence = ItemPersistence::new(SqliteKeyValueStore::new(&conn), ListVariant::Habits);

    let report = persistence.load_report();
    assert!(report.items.is_empty());
    assert_eq!(report.status, LoadStatus::Missing);
    assert!(persistence.load().is_empty());
}

#[test]
fn saved_blob_uses_variant_key_and_wire_fields() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKeyValueStore::new(&conn);
    let persistence = ItemPersistence::new(SqliteKeyValueStore::new(&conn), ListVariant::Habits);
    let item = Item::new("Journal", None);

    persistence.save(std::slice::from_ref(&item)).unwrap();

    let blob = kv.get("habits").unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&blob).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{ "id": item.id.to_string(), "habitName": "Journal" }])
    );
}

#[test]
fn variants_never_share_items() {
    let conn = open_db_in_memory().unwrap();
    let tasks = ItemPersistence::new(SqliteKeyValueStore::new(&conn), ListVariant::Tasks);
    let habits = ItemPersistence::new(SqliteKeyValueStore::new(&conn), ListVariant::Habits);

    tasks
        .save(&[Item::new("Pay rent", Some(Utc::now()))])
        .unwrap();

    assert_eq!(tasks.load().len(), 1);
    assert!(habits.load().is_empty());
    assert_eq!(habits.load_report().status, LoadStatus::Missing);
}

#[test]
fn corrupt_blob_is_discarded_as_undecodable() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKeyValueStore::new(&conn);
    kv.put("habits", b"{not json").unwrap();
    let persistence = ItemPersistence::new(kv, ListVariant::Habits);

    let report = persistence.load_report();
    assert!(report.items.is_empty());
    assert!(matches!(
        report.status,
        LoadStatus::Discarded {
            reason: DiscardReason::Undecodable(_)
        }
    ));
}

#[test]
fn dated_blob_without_creation_date_is_schema_mismatch() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKeyValueStore::new(&conn);
    kv.put(
        "tasks",
        br#"[{"id":"11111111-2222-4333-8444-555555555555","habitName":"Read"}]"#,
    )
    .unwrap();
    let persistence = ItemPersistence::new(kv, ListVariant::Tasks);

    let report = persistence.load_report();
    assert!(report.items.is_empty());
    match report.status {
        LoadStatus::Discarded {
            reason: DiscardReason::SchemaMismatch(details),
        } => assert!(details.contains("creationDate")),
        other => panic!("unexpected status: {other:?}"),
    }
}

#[test]
fn duplicate_ids_are_schema_mismatch() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKeyValueStore::new(&conn);
    kv.put(
        "habits",
        br#"[
            {"id":"11111111-2222-4333-8444-555555555555","habitName":"A"},
            {"id":"11111111-2222-4333-8444-555555555555","habitName":"B"}
        ]"#,
    )
    .unwrap();
    let persistence = ItemPersistence::new(kv, ListVariant::Habits);

    assert!(matches!(
        persistence.load_report().status,
        LoadStatus::Discarded {
            reason: DiscardReason::SchemaMismatch(_)
        }
    ));
}

#[test]
fn unknown_fields_are_ignored() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKeyValueStore::new(&conn);
    kv.put(
        "habits",
        br#"[{"id":"11111111-2222-4333-8444-555555555555","habitName":"A","streak":4}]"#,
    )
    .unwrap();
    let persistence = ItemPersistence::new(kv, ListVariant::Habits);

    let items = persistence.load();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "A");
}

#[test]
fn data_survives_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitmap.sqlite3");
    let item = Item::new("Floss", None);

    {
        let conn = open_db(&path).unwrap();
        ItemPersistence::new(SqliteKeyValueStore::new(&conn), ListVariant::Habits)
            .save(std::slice::from_ref(&item))
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let loaded =
        ItemPersistence::new(SqliteKeyValueStore::new(&conn), ListVariant::Habits).load();
    assert_eq!(loaded, vec![item]);
}

struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, key: &str) -> RepoResult<Option<Vec<u8>>> {
        Err(RepoError::InvalidKey(key.to_string()))
    }

    fn put(&self, key: &str, _value: &[u8]) -> RepoResult<()> {
        Err(RepoError::InvalidKey(key.to_string()))
    }

    fn delete(&self, key: &str) -> RepoResult<bool> {
        Err(RepoError::InvalidKey(key.to_string()))
    }
}

#[test]
fn write_failure_is_surfaced() {
    let persistence = ItemPersistence::new(UnavailableStore, ListVariant::Habits);

    let err = persistence.save(&[Item::new("Read", None)]).unwrap_err();
    assert!(matches!(err, PersistenceError::Storage(_)));
}

#[test]
fn read_failure_is_discarded_not_raised() {
    let persistence = ItemPersistence::new(UnavailableStore, ListVariant::Tasks);

    let report = persistence.load_report();
    assert!(report.items.is_empty());
    assert!(matches!(
        report.status,
        LoadStatus::Discarded {
            reason: DiscardReason::ReadFailed(_)
        }
    ));
}

#[test]
fn nil_id_blob_is_discarded() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKeyValueStore::new(&conn);
    kv.put(
        "habits",
        br#"[{"id":"00000000-0000-0000-0000-000000000000","habitName":"A"}]"#,
    )
    .unwrap();
    let persistence = ItemPersistence::new(kv, ListVariant::Habits);

    let report = persistence.load_report();
    assert!(report.items.is_empty());
    assert!(matches!(
        report.status,
        LoadStatus::Discarded {
            reason: DiscardReason::Undecodable(_)
        }
    ));
}
