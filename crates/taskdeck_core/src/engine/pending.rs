//! Pending operations: the snapshot needed to undo one optimistic write,
//! paired with the remote call that confirms it.

use crate::engine::error::OperationKind;
use crate::model::status::TaskStatus;
use crate::model::task::{TaskDelta, TaskDraft, TaskId, TaskRecord};
use crate::store::{StoreResult, TaskStore};
use uuid::Uuid;

/// Pre-mutation state captured by `begin_*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Snapshot {
    Create { key: Uuid },
    Edit { id: TaskId, before: TaskRecord },
    Delete { id: TaskId },
    Transition { id: TaskId, previous: TaskStatus },
}

/// Remote call that settles one pending operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Create(TaskDraft),
    Patch(TaskId, TaskDelta),
    Delete(TaskId),
}

impl RemoteCall {
    /// Issues the call against `store`.
    pub fn dispatch(&self, store: &impl TaskStore) -> StoreResult<Ack> {
        match self {
            Self::Create(draft) => store.create(draft).map(Ack::Record),
            Self::Patch(id, delta) => store.patch(*id, delta).map(Ack::Record),
            Self::Delete(id) => store.delete(*id).map(|()| Ack::Deleted),
        }
    }
}

/// Successful store response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Record(TaskRecord),
    Deleted,
}

/// An optimistic mutation awaiting its remote outcome.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending operation must be committed or rolled back"]
pub struct PendingOp {
    pub(crate) snapshot: Snapshot,
    pub(crate) request: RemoteCall,
}

impl PendingOp {
    pub fn kind(&self) -> OperationKind {
        match self.snapshot {
            Snapshot::Create { .. } => OperationKind::Create,
            Snapshot::Edit { .. } => OperationKind::Edit,
            Snapshot::Delete { .. } => OperationKind::Delete,
            Snapshot::Transition { .. } => OperationKind::Transition,
        }
    }

    /// Target record, `None` for creates.
    pub fn task_id(&self) -> Option<TaskId> {
        match self.snapshot {
            Snapshot::Create { .. } => None,
            Snapshot::Edit { id, .. }
            | Snapshot::Delete { id }
            | Snapshot::Transition { id, .. } => Some(id),
        }
    }

    pub fn request(&self) -> &RemoteCall {
        &self.request
    }
}

/// Cursor of one in-flight page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub page_index: u32,
    pub page_size: u32,
}
