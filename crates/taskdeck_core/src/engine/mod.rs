//! Optimistic reconciliation between the local list and the remote store.
//!
//! # Responsibility
//! - Apply user mutations to `ListState` immediately.
//! - Capture the pre-mutation snapshot needed to undo each one.
//! - Commit the store's authoritative response or roll back on failure.
//!
//! # Invariants
//! - Every `begin_*` that returns a `PendingOp` must be settled exactly once.
//! - Rollback restores only the captured snapshot, never the whole list.
//! - Deletes are not rolled back; a failed delete is reported only.
//! - The engine never retries a remote call.

mod error;
mod pending;

pub use error::{EngineError, EngineResult, OperationKind};
pub use pending::{Ack, LoadRequest, PendingOp, RemoteCall};

use crate::config::{normalize_page_size, ListConfig};
use crate::list::state::{EntryKey, ListEntry, ListState, SortRule};
use crate::model::status::{StatusAction, TaskStatus};
use crate::model::task::{TaskDelta, TaskDraft, TaskId, TaskRecord};
use crate::store::{PageResponse, StoreError, StoreResult, TaskStore};
use chrono::Utc;
use log::{debug, info, warn};
use pending::Snapshot;

/// Owns the list state and the optimistic-apply / commit / rollback rules.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    state: ListState,
    in_flight: usize,
}

impl ReconciliationEngine {
    pub fn new(config: &ListConfig) -> Self {
        let sort_rule = SortRule {
            priority_order: config.priority_order,
        };
        Self {
            state: ListState::new(normalize_page_size(config.page_size), sort_rule),
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// Filter changes are view-only and never touch the store.
    pub fn set_filter(&mut self, text: &str) {
        self.state.set_filter(text);
    }

    /// Number of mutations applied locally but not yet settled.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    // ---- page fetch -------------------------------------------------------

    /// Starts a page fetch. Later-resolving fetches overwrite earlier ones.
    pub fn begin_load(&mut self, page_index: u32) -> LoadRequest {
        self.state.mark_loading();
        LoadRequest {
            page_index,
            page_size: self.state.page_size(),
        }
    }

    /// Applies a fetch outcome. Failure keeps the previous entries.
    pub fn finish_load(
        &mut self,
        request: LoadRequest,
        result: StoreResult<PageResponse>,
    ) -> EngineResult<()> {
        match result {
            Ok(response) => {
                self.state
                    .replace_page(request.page_index, request.page_size, response);
                info!(
                    "event=list_load module=engine status=ok page={} received={} total_estimate={}",
                    self.state.page_index(),
                    self.state.len(),
                    self.state.total_estimate()
                );
                Ok(())
            }
            Err(source) => {
                warn!(
                    "event=list_load module=engine status=error page={} error={}",
                    request.page_index, source
                );
                self.state.mark_load_failed(source.to_string());
                Err(EngineError::OperationFailed {
                    kind: OperationKind::Load,
                    source,
                })
            }
        }
    }

    /// Changes the page size for the next fetch.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.state.set_page_size(page_size);
    }

    // ---- optimistic apply -------------------------------------------------

    /// Validates `draft` and appends a tentative record without an id.
    pub fn begin_create(&mut self, draft: TaskDraft) -> EngineResult<PendingOp> {
        draft.validate()?;
        let tentative = TaskRecord::tentative(&draft, Utc::now());
        let key = self.state.push_tentative(tentative);
        Ok(self.track(Snapshot::Create { key }, RemoteCall::Create(draft)))
    }

    /// Applies `delta` to the loaded copy of `id` in place.
    pub fn begin_edit(&mut self, id: TaskId, delta: TaskDelta) -> EngineResult<PendingOp> {
        delta.validate()?;
        let index = self.index_of(id)?;
        let record = self.state.record_mut(index);
        let before = record.clone();
        delta.apply_to(record);
        Ok(self.track(Snapshot::Edit { id, before }, RemoteCall::Patch(id, delta)))
    }

    /// Removes `id` from the window. Callers must have obtained confirmation.
    pub fn begin_delete(&mut self, id: TaskId) -> EngineResult<PendingOp> {
        let index = self.index_of(id)?;
        self.state.remove_at(index);
        self.state.decrement_total();
        Ok(self.track(Snapshot::Delete { id }, RemoteCall::Delete(id)))
    }

    /// Moves `id` toward `target` along the forward status graph.
    ///
    /// Returns `Ok(None)` without touching state when the graph has no edge.
    pub fn begin_transition(
        &mut self,
        id: TaskId,
        target: TaskStatus,
    ) -> EngineResult<Option<PendingOp>> {
        let index = self.index_of(id)?;
        let current = self.state.entries()[index].record.status;
        match current.transition_to(target) {
            Some(action) => self.begin_status_action(id, action),
            None => {
                debug!(
                    "event=transition module=engine status=skipped id={id} from={current} to={target}"
                );
                Ok(None)
            }
        }
    }

    /// Flips between `DONE` and `OPEN`, bypassing the forward graph.
    pub fn begin_toggle_done(&mut self, id: TaskId) -> EngineResult<Option<PendingOp>> {
        self.begin_status_action(id, StatusAction::ToggleDone)
    }

    fn begin_status_action(
        &mut self,
        id: TaskId,
        action: StatusAction,
    ) -> EngineResult<Option<PendingOp>> {
        let index = self.index_of(id)?;
        let record = self.state.record_mut(index);
        let previous = record.status;
        let Some(next) = previous.apply(action) else {
            debug!(
                "event=transition module=engine status=skipped id={id} from={previous} action={action:?}"
            );
            return Ok(None);
        };
        record.status = next;
        Ok(Some(self.track(
            Snapshot::Transition { id, previous },
            RemoteCall::Patch(id, TaskDelta::status_only(next)),
        )))
    }

    // ---- settle -----------------------------------------------------------

    /// Settles `op` with the store outcome.
    pub fn settle(&mut self, op: PendingOp, result: StoreResult<Ack>) -> EngineResult<()> {
        match result {
            Ok(ack) => self.commit(op, ack),
            Err(source) => Err(self.rollback(op, source)),
        }
    }

    /// Adopts the store's response as authoritative.
    ///
    /// An acknowledgement that does not fit the operation is treated as a failed
    /// call and rolled back.
    pub fn commit(&mut self, op: PendingOp, ack: Ack) -> EngineResult<()> {
        let kind = op.kind();
        let is_delete = matches!(op.snapshot, Snapshot::Delete { .. });
        let (id, response) = match (is_delete, ack) {
            (true, Ack::Deleted) => {
                self.release();
                info!(
                    "event=commit module=engine status=ok kind={kind} id={}",
                    op.task_id().unwrap_or_default()
                );
                return Ok(());
            }
            (false, Ack::Record(record)) => match record.id {
                Some(id) => (id, record),
                None => {
                    let source =
                        StoreError::InvalidData("acknowledged record has no id".to_string());
                    return Err(self.rollback(op, source));
                }
            },
            _ => {
                let source = StoreError::InvalidData(format!(
                    "unexpected acknowledgement for {kind} operation"
                ));
                return Err(self.rollback(op, source));
            }
        };

        match op.snapshot {
            Snapshot::Create { key } => {
                let entry = ListEntry {
                    key: EntryKey::Persisted(id),
                    record: response,
                };
                if let Some(index) = self.state.position_of(EntryKey::Tentative(key)) {
                    self.state.replace_at(index, entry);
                    self.state.increment_total();
                    self.state.resort();
                } else if let Some(index) = self.state.position_of(EntryKey::Persisted(id)) {
                    // A reload already returned and counted the record.
                    self.state.replace_at(index, entry);
                    self.state.resort();
                } else {
                    debug!("event=commit module=engine status=detached kind={kind} id={id}");
                }
            }
            Snapshot::Edit { .. } => {
                self.replace_if_loaded(id, response);
                self.state.resort();
            }
            Snapshot::Transition { .. } => {
                self.replace_if_loaded(id, response);
            }
            Snapshot::Delete { .. } => {}
        }

        self.release();
        info!("event=commit module=engine status=ok kind={kind} id={id}");
        Ok(())
    }

    /// Restores the captured snapshot and returns the error to surface.
    pub fn rollback(&mut self, op: PendingOp, source: StoreError) -> EngineError {
        let kind = op.kind();
        match op.snapshot {
            Snapshot::Create { key } => {
                if let Some(index) = self.state.position_of(EntryKey::Tentative(key)) {
                    self.state.remove_at(index);
                }
            }
            Snapshot::Edit { id, before } => {
                if let Some(index) = self.state.position_of(EntryKey::Persisted(id)) {
                    *self.state.record_mut(index) = before;
                }
            }
            Snapshot::Transition { id, previous } => {
                if let Some(index) = self.state.position_of(EntryKey::Persisted(id)) {
                    self.state.record_mut(index).status = previous;
                }
            }
            Snapshot::Delete { .. } => {}
        }

        self.release();
        warn!("event=rollback module=engine status=error kind={kind} error={source}");
        EngineError::OperationFailed { kind, source }
    }

    // ---- driven operations ------------------------------------------------

    /// Fetches one page from `store`.
    pub fn load_page(&mut self, store: &impl TaskStore, page_index: u32) -> EngineResult<()> {
        let request = self.begin_load(page_index);
        let result = store.list(request.page_index, request.page_size);
        self.finish_load(request, result)
    }

    pub fn create(&mut self, store: &impl TaskStore, draft: TaskDraft) -> EngineResult<()> {
        let op = self.begin_create(draft)?;
        self.drive(store, op)
    }

    pub fn edit(
        &mut self,
        store: &impl TaskStore,
        id: TaskId,
        delta: TaskDelta,
    ) -> EngineResult<()> {
        let op = self.begin_edit(id, delta)?;
        self.drive(store, op)
    }

    pub fn delete(&mut self, store: &impl TaskStore, id: TaskId) -> EngineResult<()> {
        let op = self.begin_delete(id)?;
        self.drive(store, op)
    }

    /// Returns whether a remote call was issued.
    pub fn transition(
        &mut self,
        store: &impl TaskStore,
        id: TaskId,
        target: TaskStatus,
    ) -> EngineResult<bool> {
        match self.begin_transition(id, target)? {
            Some(op) => self.drive(store, op).map(|()| true),
            None => Ok(false),
        }
    }

    /// Returns whether a remote call was issued.
    pub fn toggle_done(&mut self, store: &impl TaskStore, id: TaskId) -> EngineResult<bool> {
        match self.begin_toggle_done(id)? {
            Some(op) => self.drive(store, op).map(|()| true),
            None => Ok(false),
        }
    }

    fn drive(&mut self, store: &impl TaskStore, op: PendingOp) -> EngineResult<()> {
        let result = op.request().dispatch(store);
        self.settle(op, result)
    }

    // ---- helpers ----------------------------------------------------------

    fn track(&mut self, snapshot: Snapshot, request: RemoteCall) -> PendingOp {
        self.in_flight += 1;
        let op = PendingOp { snapshot, request };
        debug!(
            "event=optimistic_apply module=engine status=ok kind={} in_flight={}",
            op.kind(),
            self.in_flight
        );
        op
    }

    fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    fn index_of(&self, id: TaskId) -> EngineResult<usize> {
        self.state
            .position_of(EntryKey::Persisted(id))
            .ok_or(EngineError::NotFound(id))
    }

    fn replace_if_loaded(&mut self, id: TaskId, record: TaskRecord) {
        match self.state.position_of(EntryKey::Persisted(id)) {
            Some(index) => self.state.replace_at(
                index,
                ListEntry {
                    key: EntryKey::Persisted(id),
                    record,
                },
            ),
            None => debug!("event=commit module=engine status=detached id={id}"),
        }
    }
}
