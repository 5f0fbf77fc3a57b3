//! Core of the task list client.
//!
//! Keeps a locally materialized, paginated view of remote task records
//! consistent under optimistic create/edit/delete/status changes.

pub mod collaborators;
pub mod config;
pub mod controller;
pub mod db;
pub mod engine;
pub mod list;
pub mod logging;
pub mod model;
pub mod refresh;
pub mod store;

pub use collaborators::{Notifier, TaskDialog};
pub use config::{ListConfig, PriorityOrder, DEFAULT_PRIORITY_ORDER};
pub use controller::TaskListController;
pub use engine::{
    Ack, EngineError, EngineResult, LoadRequest, OperationKind, PendingOp, ReconciliationEngine,
    RemoteCall,
};
pub use list::recency::recency_label;
pub use list::state::{EntryKey, ListEntry, ListState, SortRule};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::status::{StatusAction, TaskStatus};
pub use model::task::{
    TaskDelta, TaskDraft, TaskId, TaskRecord, ValidationError, DEFAULT_PRIORITY, MIN_TITLE_CHARS,
};
pub use refresh::RefreshTicker;
pub use store::sqlite_store::SqliteTaskStore;
pub use store::{PageResponse, StoreError, StoreResult, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
