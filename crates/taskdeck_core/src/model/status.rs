//! Task status state machine.
//!
//! # Responsibility
//! - Define the three task states and the user actions that move between them.
//! - Keep every legality rule in a single transition table.
//!
//! # Invariants
//! - Forward graph is `OPEN -> IN_PROGRESS -> DONE`.
//! - `ToggleDone` is the only edge leaving `DONE`, and it only reaches `OPEN`.
//! - `ToggleDone` never produces `IN_PROGRESS`.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Lifecycle state of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Created but not started.
    Open,
    /// Work is in progress.
    InProgress,
    /// Completed.
    Done,
}

/// User intent that may change a task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    /// `OPEN -> IN_PROGRESS`.
    Start,
    /// `IN_PROGRESS -> DONE`.
    Complete,
    /// `DONE <-> OPEN`, bypassing `IN_PROGRESS`. A started task toggles to `DONE`.
    ToggleDone,
}

const TRANSITIONS: &[(TaskStatus, StatusAction, TaskStatus)] = &[
    (TaskStatus::Open, StatusAction::Start, TaskStatus::InProgress),
    (TaskStatus::InProgress, StatusAction::Complete, TaskStatus::Done),
    (TaskStatus::Done, StatusAction::ToggleDone, TaskStatus::Open),
    (TaskStatus::Open, StatusAction::ToggleDone, TaskStatus::Done),
    (TaskStatus::InProgress, StatusAction::ToggleDone, TaskStatus::Done),
];

impl TaskStatus {
    /// Returns the status reached by `action`, or `None` when the table has no
    /// edge for it.
    pub fn apply(self, action: StatusAction) -> Option<TaskStatus> {
        TRANSITIONS
            .iter()
            .find(|(from, edge, _)| *from == self && *edge == action)
            .map(|(_, _, to)| *to)
    }

    /// Resolves a requested target through the forward graph only.
    ///
    /// `ToggleDone` edges are not considered here; callers wanting the
    /// shortcut use [`StatusAction::ToggleDone`] explicitly.
    pub fn transition_to(self, target: TaskStatus) -> Option<StatusAction> {
        [StatusAction::Start, StatusAction::Complete]
            .into_iter()
            .find(|action| self.apply(*action) == Some(target))
    }

    /// Human-facing label, also matched by the list filter.
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In progress",
            Self::Done => "Done",
        }
    }

    /// Maps the legacy boolean completion flag onto the status enum.
    pub fn from_legacy_flag(done: bool) -> Self {
        if done {
            Self::Done
        } else {
            Self::Open
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let wire = match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        };
        f.write_str(wire)
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TaskStatusVisitor)
    }
}

struct TaskStatusVisitor;

impl Visitor<'_> for TaskStatusVisitor {
    type Value = TaskStatus;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a status string (OPEN|IN_PROGRESS|DONE) or a legacy boolean")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<TaskStatus, E> {
        Ok(TaskStatus::from_legacy_flag(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<TaskStatus, E> {
        match value {
            "OPEN" | "ABERTA" => Ok(TaskStatus::Open),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }
}
