//! SQLite-backed reference implementation of `TaskStore`.
//!
//! # Responsibility
//! - Serve the store contract in-process for the CLI and tests.
//! - Assign ids and creation timestamps the way a remote service would.
//!
//! # Invariants
//! - Listing order is `created_at DESC, id DESC`.
//! - Timestamps are stored as RFC 3339 UTC text with millisecond precision so
//!   lexical order matches chronological order.

use crate::model::status::TaskStatus;
use crate::model::task::{TaskDelta, TaskDraft, TaskId, TaskRecord, DEFAULT_PRIORITY};
use crate::store::{PageResponse, StoreError, StoreResult, TaskStore};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TASK_SELECT_SQL: &str = "SELECT id, title, description, status, priority, created_at FROM tasks";

/// Task store over one borrowed SQLite connection.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
    report_totals: bool,
}

impl<'conn> SqliteTaskStore<'conn> {
    /// Store that reports `totalElements` on every page.
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            report_totals: true,
        }
    }

    /// Store that omits `totalElements`, like services without count support.
    pub fn without_totals(conn: &'conn Connection) -> Self {
        Self {
            conn,
            report_totals: false,
        }
    }

    /// Inserts a fully specified record, keeping its id and timestamp.
    ///
    /// Used by import paths and fixtures.
    pub fn import(&self, record: &TaskRecord) -> StoreResult<TaskRecord> {
        validate_for_store(&record.title)?;
        let created_at = record.created_at.unwrap_or_else(Utc::now);
        self.conn.execute(
            "INSERT INTO tasks (id, title, description, status, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                record.id,
                record.title.trim(),
                record.description.as_deref(),
                record.status.to_string(),
                record.priority,
                timestamp_to_db(created_at),
            ],
        )?;
        self.get(self.conn.last_insert_rowid())
    }

    fn get(&self, id: TaskId) -> StoreResult<TaskRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id], |row| Ok(parse_task_row(row)))
            .optional()?;
        match row {
            Some(parsed) => parsed,
            None => Err(StoreError::NotFound(id)),
        }
    }

    fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))?;
        u64::try_from(count).map_err(|_| StoreError::InvalidData(format!("negative count {count}")))
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn list(&self, page_index: u32, page_size: u32) -> StoreResult<PageResponse> {
        let offset = i64::from(page_index) * i64::from(page_size);
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL} ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(page_size), offset])?;
        let mut content = Vec::new();
        while let Some(row) = rows.next()? {
            content.push(parse_task_row(row)?);
        }

        let total_elements = if self.report_totals {
            Some(self.count()?)
        } else {
            None
        };
        debug!(
            "event=store_list module=store status=ok page={page_index} size={page_size} received={}",
            content.len()
        );

        Ok(PageResponse {
            content,
            page: Some(page_index),
            size: Some(page_size),
            total_elements,
        })
    }

    fn create(&self, draft: &TaskDraft) -> StoreResult<TaskRecord> {
        validate_for_store(&draft.title)?;
        self.conn.execute(
            "INSERT INTO tasks (title, description, status, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                draft.title.trim(),
                draft.description.as_deref(),
                TaskStatus::Open.to_string(),
                draft.priority.unwrap_or(DEFAULT_PRIORITY),
                timestamp_to_db(Utc::now()),
            ],
        )?;
        self.get(self.conn.last_insert_rowid())
    }

    fn patch(&self, id: TaskId, delta: &TaskDelta) -> StoreResult<TaskRecord> {
        if let Some(title) = delta.title.as_deref() {
            validate_for_store(title)?;
        }
        let mut record = self.get(id)?;
        delta.apply_to(&mut record);

        self.conn.execute(
            "UPDATE tasks
             SET title = ?1, description = ?2, status = ?3, priority = ?4
             WHERE id = ?5;",
            params![
                record.title.as_str(),
                record.description.as_deref(),
                record.status.to_string(),
                record.priority,
                id,
            ],
        )?;
        self.get(id)
    }

    fn delete(&self, id: TaskId) -> StoreResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            warn!("event=store_delete module=store status=not_found id={id}");
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

fn validate_for_store(title: &str) -> StoreResult<()> {
    crate::model::task::validate_title(title).map_err(|err| StoreError::Rejected(err.to_string()))
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<TaskRecord> {
    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid status `{status_text}` in tasks.status"))
    })?;

    let created_text: String = row.get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_text)
        .map_err(|err| {
            StoreError::InvalidData(format!(
                "invalid timestamp `{created_text}` in tasks.created_at: {err}"
            ))
        })?
        .with_timezone(&Utc);

    Ok(TaskRecord {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        priority: row.get("priority")?,
        created_at: Some(created_at),
    })
}

fn parse_status(value: &str) -> Option<TaskStatus> {
    match value {
        "OPEN" => Some(TaskStatus::Open),
        "IN_PROGRESS" => Some(TaskStatus::InProgress),
        "DONE" => Some(TaskStatus::Done),
        _ => None,
    }
}

fn timestamp_to_db(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
