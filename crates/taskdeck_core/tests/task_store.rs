mod common;

use common::{at, task};
use rusqlite::Connection;
use taskdeck_core::db::migrations::latest_version;
use taskdeck_core::db::{open_db, open_db_in_memory, DbError};
use taskdeck_core::{
    SqliteTaskStore, StoreError, TaskDelta, TaskDraft, TaskStatus, TaskStore, DEFAULT_PRIORITY,
};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'tasks');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1);
}

#[test]
fn reopening_file_database_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");

    let conn = open_db(&path).unwrap();
    let created = SqliteTaskStore::new(&conn)
        .create(&TaskDraft::new("Buy milk"))
        .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let page = SqliteTaskStore::new(&conn).list(0, 10).unwrap();
    assert_eq!(page.content, vec![created]);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn create_assigns_identity_timestamp_and_defaults() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let created = store
        .create(&TaskDraft::new("  Buy milk  ").with_description("2 litres"))
        .unwrap();

    assert!(created.id.is_some());
    assert!(created.created_at.is_some());
    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.status, TaskStatus::Open);
    assert_eq!(created.priority, DEFAULT_PRIORITY);
    assert_eq!(created.description.as_deref(), Some("2 litres"));
}

#[test]
fn list_pages_newest_first_and_reports_totals_on_request() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);
    for id in 1..=3 {
        store
            .import(&task(id, &format!("Task {id}"), 3, at(id as u32, 0)))
            .unwrap();
    }

    let first = store.list(0, 2).unwrap();
    let ids: Vec<_> = first.content.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![Some(3), Some(2)]);
    assert_eq!(first.total_elements, Some(3));
    assert_eq!((first.page, first.size), (Some(0), Some(2)));

    let silent = SqliteTaskStore::without_totals(&conn).list(1, 2).unwrap();
    assert_eq!(silent.content.len(), 1);
    assert_eq!(silent.total_elements, None);
}

#[test]
fn patch_is_partial_and_returns_post_update_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);
    let original = store.import(&task(4, "Walk dog", 3, at(1, 0))).unwrap();

    let patched = store
        .patch(4, &TaskDelta::status_only(TaskStatus::InProgress))
        .unwrap();

    assert_eq!(patched.status, TaskStatus::InProgress);
    assert_eq!(patched.title, original.title);
    assert_eq!(patched.created_at, original.created_at);
}

#[test]
fn patch_and_delete_of_missing_task_fail() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let patch_err = store
        .patch(9, &TaskDelta::status_only(TaskStatus::Done))
        .unwrap_err();
    assert!(matches!(patch_err, StoreError::NotFound(9)));
    assert!(matches!(store.delete(9), Err(StoreError::NotFound(9))));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}
