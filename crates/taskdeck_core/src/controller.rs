//! Presentation-facing controller for one task list view.
//!
//! # Responsibility
//! - Turn user intents into engine operations via the dialog collaborator.
//! - Surface every outcome exactly once through the notifier.
//!
//! # Invariants
//! - Cancelled dialogs and declined confirmations leave state untouched.
//! - Delete is never applied before confirmation.
//! - The refresh ticker lives no longer than the controller that owns it.

use crate::collaborators::{Notifier, TaskDialog};
use crate::config::{normalize_page_size, ListConfig};
use crate::engine::{EngineError, EngineResult, OperationKind, ReconciliationEngine};
use crate::list::state::ListState;
use crate::model::status::TaskStatus;
use crate::model::task::{TaskId, TaskRecord};
use crate::refresh::RefreshTicker;
use crate::store::TaskStore;

const DELETE_CONFIRM_TITLE: &str = "Delete task";

/// Wires the reconciliation engine to its store and UI collaborators.
pub struct TaskListController<S: TaskStore, D: TaskDialog, N: Notifier> {
    engine: ReconciliationEngine,
    store: S,
    dialog: D,
    notifier: N,
    config: ListConfig,
    refresh: Option<RefreshTicker>,
}

impl<S: TaskStore, D: TaskDialog, N: Notifier> TaskListController<S, D, N> {
    pub fn new(config: ListConfig, store: S, dialog: D, notifier: N) -> Self {
        let config = config.normalized();
        Self {
            engine: ReconciliationEngine::new(&config),
            store,
            dialog,
            notifier,
            config,
            refresh: None,
        }
    }

    pub fn state(&self) -> &ListState {
        self.engine.state()
    }

    pub fn view(&self) -> Vec<&TaskRecord> {
        self.engine.state().view()
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ---- pagination and filter ---------------------------------------------

    pub fn load_page(&mut self, page_index: u32) -> EngineResult<()> {
        let result = self.engine.load_page(&self.store, page_index);
        self.report(result, None)
    }

    pub fn reload(&mut self) -> EngineResult<()> {
        let current = self.state().page_index();
        self.load_page(current)
    }

    pub fn next_page(&mut self) -> EngineResult<()> {
        if !self.state().has_next_page() {
            return Ok(());
        }
        let next = self.state().page_index() + 1;
        self.load_page(next)
    }

    pub fn previous_page(&mut self) -> EngineResult<()> {
        match self.state().page_index().checked_sub(1) {
            Some(previous) => self.load_page(previous),
            None => Ok(()),
        }
    }

    /// Changes page size and restarts from the first page.
    pub fn set_page_size(&mut self, page_size: u32) -> EngineResult<()> {
        self.engine.set_page_size(normalize_page_size(page_size));
        self.load_page(0)
    }

    pub fn set_filter(&mut self, text: &str) {
        self.engine.set_filter(text);
    }

    // ---- periodic refresh --------------------------------------------------

    /// Starts re-rendering every `config.refresh_interval()`, replacing any
    /// running ticker. Must be called inside a tokio runtime.
    pub fn start_refresh<F>(&mut self, on_tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.stop_refresh();
        self.refresh = Some(RefreshTicker::start(self.config.refresh_interval(), on_tick));
    }

    pub fn stop_refresh(&mut self) {
        if let Some(mut ticker) = self.refresh.take() {
            ticker.stop();
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.as_ref().is_some_and(RefreshTicker::is_running)
    }

    // ---- mutations ---------------------------------------------------------

    /// Opens the create dialog and creates the returned draft.
    pub fn create(&mut self) -> EngineResult<()> {
        let Some(draft) = self.dialog.open_create() else {
            return Ok(());
        };
        let result = self.engine.create(&self.store, draft);
        self.report(result, Some("Task created."))
    }

    /// Opens the edit dialog for `id` and applies the returned delta.
    pub fn edit(&mut self, id: TaskId) -> EngineResult<()> {
        let Some(record) = self.state().get(id).cloned() else {
            return self.report(Err(EngineError::NotFound(id)), None);
        };
        let Some(delta) = self.dialog.open_edit(&record) else {
            return Ok(());
        };
        if delta.is_empty() {
            return Ok(());
        }
        let result = self.engine.edit(&self.store, id, delta);
        self.report(result, Some("Task updated."))
    }

    /// Deletes `id` after the user confirms.
    pub fn delete(&mut self, id: TaskId) -> EngineResult<()> {
        let Some(record) = self.state().get(id) else {
            return self.report(Err(EngineError::NotFound(id)), None);
        };
        let message = format!("Delete \"{}\"? This cannot be undone.", record.title);
        if !self.dialog.confirm_destructive(DELETE_CONFIRM_TITLE, &message) {
            return Ok(());
        }
        let result = self.engine.delete(&self.store, id);
        self.report(result, Some("Task deleted."))
    }

    /// `OPEN -> IN_PROGRESS`; silently ignored from any other state.
    pub fn start(&mut self, id: TaskId) -> EngineResult<()> {
        self.transition(id, TaskStatus::InProgress)
    }

    /// `IN_PROGRESS -> DONE`; silently ignored from any other state.
    pub fn complete(&mut self, id: TaskId) -> EngineResult<()> {
        self.transition(id, TaskStatus::Done)
    }

    pub fn transition(&mut self, id: TaskId, target: TaskStatus) -> EngineResult<()> {
        let result = self.engine.transition(&self.store, id, target);
        self.report(result.map(|_| ()), None)
    }

    pub fn toggle_done(&mut self, id: TaskId) -> EngineResult<()> {
        let result = self.engine.toggle_done(&self.store, id);
        self.report(result.map(|_| ()), None)
    }

    fn report(&self, result: EngineResult<()>, success: Option<&str>) -> EngineResult<()> {
        let duration_ms = self.config.notify_duration_ms;
        match &result {
            Ok(()) => {
                if let Some(message) = success {
                    self.notifier.notify(message, duration_ms);
                }
            }
            Err(err) => self.notifier.notify(&failure_message(err), duration_ms),
        }
        result
    }
}

fn failure_message(err: &EngineError) -> String {
    match err {
        EngineError::Validation(inner) => format!("Invalid task: {inner}."),
        EngineError::NotFound(id) => format!("Task {id} is no longer on this page."),
        EngineError::OperationFailed {
            kind: OperationKind::Load,
            source,
        } => format!("Could not load tasks: {source}."),
        EngineError::OperationFailed { kind, source } => {
            format!("Could not {kind} task: {source}.")
        }
    }
}
