mod common;

use common::{at, task, FlakyStore};
use rusqlite::Connection;
use taskdeck_core::db::open_db_in_memory;
use taskdeck_core::{
    Ack, EngineError, ListConfig, OperationKind, PageResponse, ReconciliationEngine,
    SqliteTaskStore, StoreError, TaskDelta, TaskDraft, TaskRecord, TaskStatus, TaskStore,
};

fn seeded<'c>(conn: &'c Connection, records: &[TaskRecord]) -> FlakyStore<'c> {
    let store = FlakyStore::new(SqliteTaskStore::new(conn));
    for record in records {
        store.inner.import(record).unwrap();
    }
    store
}

fn loaded_engine(store: &FlakyStore<'_>) -> ReconciliationEngine {
    let mut engine = ReconciliationEngine::new(&ListConfig::default());
    engine.load_page(store, 0).unwrap();
    engine
}

fn ids(engine: &ReconciliationEngine) -> Vec<Option<i64>> {
    engine.state().items().map(|record| record.id).collect()
}

#[test]
fn successful_create_leaves_exactly_the_store_record() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(&conn, &[task(1, "Walk dog", 3, at(1, 0))]);
    let mut engine = loaded_engine(&store);

    engine
        .create(&store, TaskDraft::new("Buy milk").with_priority(2))
        .unwrap();

    let stored = store.inner.list(0, 10).unwrap().content;
    let created = stored
        .iter()
        .find(|record| record.title == "Buy milk")
        .expect("store should hold the new task");
    let matching: Vec<_> = engine
        .state()
        .items()
        .filter(|record| record.title == "Buy milk")
        .collect();
    assert_eq!(matching, vec![created]);
    assert!(engine.state().entries().iter().all(|entry| !entry.is_tentative()));
    assert_eq!(engine.state().total_estimate(), 2);
    assert_eq!(engine.in_flight(), 0);
}

#[test]
fn create_commit_replaces_tentative_with_acknowledged_record() {
    let mut engine = ReconciliationEngine::new(&ListConfig::default());

    let op = engine
        .begin_create(TaskDraft::new("Buy milk").with_priority(2))
        .unwrap();
    assert_eq!(engine.state().len(), 1);
    assert!(engine.state().entries()[0].is_tentative());
    assert_eq!(engine.state().entries()[0].record.id, None);

    let acknowledged = TaskRecord {
        id: Some(7),
        title: "Buy milk".to_string(),
        description: None,
        status: TaskStatus::Open,
        priority: 2,
        created_at: Some("2024-01-01T00:00:00Z".parse().unwrap()),
    };
    engine.commit(op, Ack::Record(acknowledged.clone())).unwrap();

    engine.set_filter("milk");
    let view = engine.state().view();
    assert_eq!(view.first().and_then(|record| record.id), Some(7));
    assert_eq!(view, vec![&acknowledged]);
    assert_eq!(engine.state().len(), 1);
}

#[test]
fn failed_create_restores_previous_state() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(&conn, &[task(1, "Walk dog", 3, at(1, 0))]);
    let mut engine = loaded_engine(&store);
    let before = engine.state().clone();

    store.fail_next("create");
    let err = engine
        .create(&store, TaskDraft::new("Buy milk"))
        .unwrap_err();

    assert_eq!(err.kind(), Some(OperationKind::Create));
    assert_eq!(engine.state(), &before);
    assert_eq!(engine.in_flight(), 0);
}

#[test]
fn invalid_draft_never_reaches_the_store() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(&conn, &[]);
    let mut engine = loaded_engine(&store);

    let err = engine.create(&store, TaskDraft::new("ok")).unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(store.calls(), vec!["list"]);
    assert!(engine.state().is_empty());
}

#[test]
fn edit_commit_adopts_response_and_resorts() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(
        &conn,
        &[task(1, "Buy milk", 3, at(5, 0)), task(2, "Walk dog", 2, at(5, 0))],
    );
    let mut engine = loaded_engine(&store);
    assert_eq!(ids(&engine), vec![Some(2), Some(1)]);

    let delta = TaskDelta {
        priority: Some(1),
        description: Some("semi-skimmed".to_string()),
        ..TaskDelta::default()
    };
    engine.edit(&store, 1, delta).unwrap();

    assert_eq!(ids(&engine), vec![Some(1), Some(2)]);
    let edited = engine.state().get(1).unwrap();
    assert_eq!(edited.description.as_deref(), Some("semi-skimmed"));
    let stored = store.inner.list(0, 10).unwrap().content;
    let stored_edit = stored.iter().find(|record| record.id == Some(1)).unwrap();
    assert_eq!(edited, stored_edit);
}

#[test]
fn failed_edit_restores_previous_state() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(
        &conn,
        &[task(1, "Buy milk", 3, at(5, 0)), task(2, "Walk dog", 3, at(5, 0))],
    );
    let mut engine = loaded_engine(&store);
    let before = engine.state().clone();

    store.fail_next("patch");
    let delta = TaskDelta {
        title: Some("Buy oat milk".to_string()),
        priority: Some(1),
        ..TaskDelta::default()
    };
    let err = engine.edit(&store, 2, delta).unwrap_err();

    assert_eq!(err.kind(), Some(OperationKind::Edit));
    assert_eq!(engine.state(), &before);
}

#[test]
fn edit_of_record_outside_page_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(&conn, &[task(1, "Buy milk", 3, at(5, 0))]);
    let mut engine = loaded_engine(&store);

    let err = engine
        .edit(&store, 99, TaskDelta::status_only(TaskStatus::Done))
        .unwrap_err();

    assert!(matches!(err, EngineError::NotFound(99)));
    assert_eq!(store.calls(), vec!["list"]);
}

#[test]
fn delete_removes_immediately_even_when_store_fails() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(
        &conn,
        &[task(1, "Buy milk", 3, at(5, 0)), task(2, "Walk dog", 3, at(4, 0))],
    );
    let mut engine = loaded_engine(&store);
    assert_eq!(engine.state().total_estimate(), 2);

    let op = engine.begin_delete(1).unwrap();
    assert!(engine.state().get(1).is_none());
    assert_eq!(engine.state().total_estimate(), 1);

    let err = engine
        .settle(op, Err(StoreError::Transport("timeout".to_string())))
        .unwrap_err();
    assert_eq!(err.kind(), Some(OperationKind::Delete));
    assert!(engine.state().get(1).is_none());
    assert_eq!(ids(&engine), vec![Some(2)]);
}

#[test]
fn delete_floors_total_estimate_at_zero() {
    let mut engine = ReconciliationEngine::new(&ListConfig::default());
    let request = engine.begin_load(0);
    let stale_total = PageResponse {
        content: vec![task(1, "Buy milk", 3, at(5, 0)), task(2, "Walk dog", 3, at(4, 0))],
        page: None,
        size: None,
        total_elements: Some(1),
    };
    engine.finish_load(request, Ok(stale_total)).unwrap();

    for id in [1, 2] {
        let op = engine.begin_delete(id).unwrap();
        engine.commit(op, Ack::Deleted).unwrap();
    }

    assert_eq!(engine.state().total_estimate(), 0);
    assert!(engine.state().is_empty());
    assert!(matches!(engine.begin_delete(1), Err(EngineError::NotFound(1))));
}

#[test]
fn complete_on_open_record_is_a_silent_no_op() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(&conn, &[task(1, "Buy milk", 3, at(5, 0))]);
    let mut engine = loaded_engine(&store);
    let before = engine.state().clone();

    let issued = engine.transition(&store, 1, TaskStatus::Done).unwrap();

    assert!(!issued);
    assert_eq!(engine.state(), &before);
    assert_eq!(store.calls(), vec!["list"]);
    assert_eq!(engine.in_flight(), 0);
}

#[test]
fn transition_walks_forward_graph() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(&conn, &[task(1, "Buy milk", 3, at(5, 0))]);
    let mut engine = loaded_engine(&store);

    assert!(engine.transition(&store, 1, TaskStatus::InProgress).unwrap());
    assert!(engine.transition(&store, 1, TaskStatus::Done).unwrap());

    assert_eq!(engine.state().get(1).unwrap().status, TaskStatus::Done);
    assert_eq!(store.calls(), vec!["list", "patch", "patch"]);
}

#[test]
fn failed_transition_reverts_status() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(&conn, &[task(7, "Buy milk", 2, at(1, 0))]);
    let mut engine = loaded_engine(&store);
    let before = engine.state().clone();

    let op = engine
        .begin_transition(7, TaskStatus::InProgress)
        .unwrap()
        .expect("OPEN -> IN_PROGRESS is legal");
    assert_eq!(engine.state().get(7).unwrap().status, TaskStatus::InProgress);
    assert_eq!(
        op.request(),
        &taskdeck_core::RemoteCall::Patch(7, TaskDelta::status_only(TaskStatus::InProgress))
    );

    store.fail_next("patch");
    let result = op.request().dispatch(&store);
    let err = engine.settle(op, result).unwrap_err();

    assert_eq!(err.kind(), Some(OperationKind::Transition));
    assert_eq!(engine.state().get(7).unwrap().status, TaskStatus::Open);
    assert_eq!(engine.state(), &before);
}

#[test]
fn toggle_done_round_trips_between_done_and_open() {
    let conn = open_db_in_memory().unwrap();
    let mut done = task(1, "Buy milk", 3, at(5, 0));
    done.status = TaskStatus::Done;
    let store = seeded(&conn, &[done]);
    let mut engine = loaded_engine(&store);

    assert!(engine.toggle_done(&store, 1).unwrap());
    assert_eq!(engine.state().get(1).unwrap().status, TaskStatus::Open);
    assert!(engine.toggle_done(&store, 1).unwrap());
    assert_eq!(engine.state().get(1).unwrap().status, TaskStatus::Done);
}

#[test]
fn toggle_done_completes_in_progress_record() {
    let conn = open_db_in_memory().unwrap();
    let mut started = task(1, "Buy milk", 3, at(5, 0));
    started.status = TaskStatus::InProgress;
    let store = seeded(&conn, &[started]);
    let mut engine = loaded_engine(&store);

    assert!(engine.toggle_done(&store, 1).unwrap());
    assert_eq!(engine.state().get(1).unwrap().status, TaskStatus::Done);
}

#[test]
fn failed_toggle_done_restores_previous_state() {
    let conn = open_db_in_memory().unwrap();
    let mut done = task(1, "Buy milk", 3, at(5, 0));
    done.status = TaskStatus::Done;
    let store = seeded(&conn, &[done, task(2, "Walk dog", 1, at(4, 0))]);
    let mut engine = loaded_engine(&store);
    let before = engine.state().clone();

    let op = engine
        .begin_toggle_done(1)
        .unwrap()
        .expect("DONE toggles back to OPEN");
    assert_eq!(engine.state().get(1).unwrap().status, TaskStatus::Open);

    store.fail_next("patch");
    let result = op.request().dispatch(&store);
    let err = engine.settle(op, result).unwrap_err();

    assert_eq!(err.kind(), Some(OperationKind::Transition));
    assert_eq!(engine.state(), &before);
}

#[test]
fn concurrent_operations_on_different_records_settle_independently() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(
        &conn,
        &[task(1, "Buy milk", 3, at(5, 0)), task(2, "Walk dog", 3, at(4, 0))],
    );
    let mut engine = loaded_engine(&store);
    let original_milk = engine.state().get(1).unwrap().clone();

    let edit = engine
        .begin_edit(
            1,
            TaskDelta {
                title: Some("Buy bread".to_string()),
                ..TaskDelta::default()
            },
        )
        .unwrap();
    let start = engine
        .begin_transition(2, TaskStatus::InProgress)
        .unwrap()
        .unwrap();
    assert_eq!(engine.in_flight(), 2);

    let started = start.request().dispatch(&store);
    engine.settle(start, started).unwrap();
    let err = engine.rollback(edit, StoreError::Transport("reset".to_string()));

    assert_eq!(err.kind(), Some(OperationKind::Edit));
    assert_eq!(engine.state().get(1), Some(&original_milk));
    assert_eq!(engine.state().get(2).unwrap().status, TaskStatus::InProgress);
    assert_eq!(engine.in_flight(), 0);
}

#[test]
fn create_commit_after_reload_does_not_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(&conn, &[task(1, "Walk dog", 3, at(1, 0))]);
    let mut engine = loaded_engine(&store);

    let draft = TaskDraft::new("Buy milk");
    let op = engine.begin_create(draft.clone()).unwrap();
    let created = store.create(&draft).unwrap();
    engine.load_page(&store, 0).unwrap();
    assert!(engine.state().entries().iter().all(|entry| !entry.is_tentative()));

    engine.commit(op, Ack::Record(created.clone())).unwrap();

    let copies = engine
        .state()
        .items()
        .filter(|record| record.id == created.id)
        .count();
    assert_eq!(copies, 1);
    assert_eq!(engine.state().total_estimate(), 2);
}

#[test]
fn create_commit_after_page_change_leaves_window_alone() {
    let conn = open_db_in_memory().unwrap();
    let records: Vec<_> = (1..=3)
        .map(|id| task(id, "Seeded task", 3, at(id as u32, 0)))
        .collect();
    let store = seeded(&conn, &records);
    let mut engine = ReconciliationEngine::new(&ListConfig {
        page_size: 2,
        ..ListConfig::default()
    });
    engine.load_page(&store, 0).unwrap();

    let draft = TaskDraft::new("Buy milk");
    let op = engine.begin_create(draft.clone()).unwrap();
    let created = store.create(&draft).unwrap();
    engine.load_page(&store, 1).unwrap();
    let before = engine.state().clone();
    assert!(before.get(created.id.unwrap()).is_none());

    engine.commit(op, Ack::Record(created)).unwrap();

    assert_eq!(engine.state(), &before);
    assert_eq!(engine.state().total_estimate(), 4);
    assert_eq!(engine.in_flight(), 0);
}

#[test]
fn acknowledgement_without_id_rolls_back_create() {
    let mut engine = ReconciliationEngine::new(&ListConfig::default());
    let op = engine.begin_create(TaskDraft::new("Buy milk")).unwrap();
    let record = engine.state().entries()[0].record.clone();

    let err = engine.commit(op, Ack::Record(record)).unwrap_err();

    assert_eq!(err.kind(), Some(OperationKind::Create));
    assert!(engine.state().is_empty());
}

#[test]
fn failed_load_keeps_previous_page_and_flags_error() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(&conn, &[task(1, "Buy milk", 3, at(5, 0))]);
    let mut engine = loaded_engine(&store);
    let before_items: Vec<_> = engine.state().items().cloned().collect();

    store.fail_next("list");
    let err = engine.load_page(&store, 1).unwrap_err();

    assert_eq!(err.kind(), Some(OperationKind::Load));
    let after_items: Vec<_> = engine.state().items().cloned().collect();
    assert_eq!(after_items, before_items);
    assert!(engine.state().load_error().is_some());
    assert!(!engine.state().is_loading());
    assert_eq!(engine.state().page_index(), 0);

    engine.load_page(&store, 0).unwrap();
    assert!(engine.state().load_error().is_none());
}

#[test]
fn estimator_infers_totals_when_store_omits_them() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::without_totals(&conn);
    for id in 1..=14 {
        store
            .import(&task(id, &format!("Task {id}"), 3, at(1, id as u32)))
            .unwrap();
    }
    let mut engine = ReconciliationEngine::new(&ListConfig::default());

    engine.load_page(&store, 0).unwrap();
    assert_eq!(engine.state().len(), 10);
    assert_eq!(engine.state().total_estimate(), 11);
    assert!(engine.state().has_next_page());

    engine.load_page(&store, 1).unwrap();
    assert_eq!(engine.state().len(), 4);
    assert_eq!(engine.state().total_estimate(), 14);
    assert!(!engine.state().has_next_page());
}

#[test]
fn short_first_page_without_totals_is_exact() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::without_totals(&conn);
    for id in 1..=4 {
        store
            .import(&task(id, &format!("Task {id}"), 3, at(1, id as u32)))
            .unwrap();
    }
    let mut engine = ReconciliationEngine::new(&ListConfig::default());

    engine.load_page(&store, 0).unwrap();

    assert_eq!(engine.state().total_estimate(), 4);
}

#[test]
fn last_resolved_fetch_wins() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);
    for id in 1..=12 {
        store
            .import(&task(id, &format!("Task {id}"), 3, at(1, id as u32)))
            .unwrap();
    }
    let mut engine = ReconciliationEngine::new(&ListConfig::default());

    let first = engine.begin_load(0);
    let second = engine.begin_load(1);
    let second_page = store.list(second.page_index, second.page_size);
    engine.finish_load(second, second_page).unwrap();
    let first_page = store.list(first.page_index, first.page_size);
    engine.finish_load(first, first_page).unwrap();

    assert_eq!(engine.state().page_index(), 0);
    assert_eq!(engine.state().len(), 10);
}

#[test]
fn identical_timestamps_order_by_ascending_priority() {
    let conn = open_db_in_memory().unwrap();
    let store = seeded(
        &conn,
        &[
            task(1, "Low urgency", 5, at(2, 0)),
            task(2, "High urgency", 1, at(2, 0)),
            task(3, "Mid urgency", 3, at(2, 0)),
        ],
    );
    let engine = loaded_engine(&store);

    let priorities: Vec<_> = engine.state().items().map(|record| record.priority).collect();
    assert_eq!(priorities, vec![1, 3, 5]);
}
