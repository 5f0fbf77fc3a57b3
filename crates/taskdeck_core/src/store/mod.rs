//! Remote task store contract and reference backend.
//!
//! # Responsibility
//! - Define the list/create/patch/delete contract consumed by the engine.
//! - Define the page envelope, including the legacy bare-array listing.
//!
//! # Invariants
//! - `patch` and `create` responses are authoritative post-write records.
//! - `total_elements`, `page` and `size` are authoritative when present.
//! - Every failure surfaces as one `StoreError`; callers treat them uniformly.

use crate::db::DbError;
use crate::model::task::{TaskDelta, TaskDraft, TaskId, TaskRecord};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sqlite_store;

pub type StoreResult<T> = Result<T, StoreError>;

/// Transport-level failure of one remote call.
#[derive(Debug)]
pub enum StoreError {
    Transport(String),
    Rejected(String),
    NotFound(TaskId),
    InvalidData(String),
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "task store unreachable: {message}"),
            Self::Rejected(message) => write!(f, "task store rejected request: {message}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid task data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One page of records returned by `TaskStore::list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PageWire")]
pub struct PageResponse {
    pub content: Vec<TaskRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
}

impl PageResponse {
    /// Page with no metadata, as returned by un-paginated listings.
    pub fn bare(content: Vec<TaskRecord>) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageWire {
    Paged(PagedEnvelope),
    Bare(Vec<TaskRecord>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PagedEnvelope {
    content: Vec<TaskRecord>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    size: Option<u32>,
    #[serde(default)]
    total_elements: Option<u64>,
}

impl From<PageWire> for PageResponse {
    fn from(value: PageWire) -> Self {
        match value {
            PageWire::Paged(envelope) => Self {
                content: envelope.content,
                page: envelope.page,
                size: envelope.size,
                total_elements: envelope.total_elements,
            },
            PageWire::Bare(content) => Self::bare(content),
        }
    }
}

/// Source of truth for task records.
pub trait TaskStore {
    fn list(&self, page_index: u32, page_size: u32) -> StoreResult<PageResponse>;
    fn create(&self, draft: &TaskDraft) -> StoreResult<TaskRecord>;
    fn patch(&self, id: TaskId, delta: &TaskDelta) -> StoreResult<TaskRecord>;
    fn delete(&self, id: TaskId) -> StoreResult<()>;
}

impl<T: TaskStore + ?Sized> TaskStore for &T {
    fn list(&self, page_index: u32, page_size: u32) -> StoreResult<PageResponse> {
        (**self).list(page_index, page_size)
    }

    fn create(&self, draft: &TaskDraft) -> StoreResult<TaskRecord> {
        (**self).create(draft)
    }

    fn patch(&self, id: TaskId, delta: &TaskDelta) -> StoreResult<TaskRecord> {
        (**self).patch(id, delta)
    }

    fn delete(&self, id: TaskId) -> StoreResult<()> {
        (**self).delete(id)
    }
}
