#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use taskdeck_core::{
    Notifier, PageResponse, SqliteTaskStore, StoreError, StoreResult, TaskDelta, TaskDialog,
    TaskDraft, TaskId, TaskRecord, TaskStatus, TaskStore,
};

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

pub fn task(id: TaskId, title: &str, priority: i32, created_at: DateTime<Utc>) -> TaskRecord {
    TaskRecord {
        id: Some(id),
        title: title.to_string(),
        description: None,
        status: TaskStatus::Open,
        priority,
        created_at: Some(created_at),
    }
}

/// SQLite store that can be told to fail its next call of a given kind.
pub struct FlakyStore<'conn> {
    pub inner: SqliteTaskStore<'conn>,
    failing: RefCell<Vec<&'static str>>,
    calls: RefCell<Vec<&'static str>>,
}

impl<'conn> FlakyStore<'conn> {
    pub fn new(inner: SqliteTaskStore<'conn>) -> Self {
        Self {
            inner,
            failing: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Queues one failure for the next `list|create|patch|delete` call.
    pub fn fail_next(&self, call: &'static str) {
        self.failing.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn enter(&self, call: &'static str) -> StoreResult<()> {
        self.calls.borrow_mut().push(call);
        let mut failing = self.failing.borrow_mut();
        match failing.iter().position(|queued| *queued == call) {
            Some(index) => {
                failing.remove(index);
                Err(StoreError::Transport(format!("simulated {call} outage")))
            }
            None => Ok(()),
        }
    }
}

impl TaskStore for FlakyStore<'_> {
    fn list(&self, page_index: u32, page_size: u32) -> StoreResult<PageResponse> {
        self.enter("list")?;
        self.inner.list(page_index, page_size)
    }

    fn create(&self, draft: &TaskDraft) -> StoreResult<TaskRecord> {
        self.enter("create")?;
        self.inner.create(draft)
    }

    fn patch(&self, id: TaskId, delta: &TaskDelta) -> StoreResult<TaskRecord> {
        self.enter("patch")?;
        self.inner.patch(id, delta)
    }

    fn delete(&self, id: TaskId) -> StoreResult<()> {
        self.enter("delete")?;
        self.inner.delete(id)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: RefCell<Vec<(String, u64)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    pub fn durations(&self) -> Vec<u64> {
        self.messages.borrow().iter().map(|(_, ms)| *ms).collect()
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, duration_ms: u64) {
        self.messages
            .borrow_mut()
            .push((message.to_string(), duration_ms));
    }
}

/// Dialog returning pre-set answers.
#[derive(Default)]
pub struct ScriptedDialog {
    pub create: RefCell<Option<TaskDraft>>,
    pub edit: RefCell<Option<TaskDelta>>,
    pub confirm: Cell<bool>,
    pub confirmations: RefCell<Vec<String>>,
}

impl TaskDialog for ScriptedDialog {
    fn open_create(&self) -> Option<TaskDraft> {
        self.create.borrow_mut().take()
    }

    fn open_edit(&self, _record: &TaskRecord) -> Option<TaskDelta> {
        self.edit.borrow_mut().take()
    }

    fn confirm_destructive(&self, _title: &str, message: &str) -> bool {
        self.confirmations.borrow_mut().push(message.to_string());
        self.confirm.get()
    }
}
