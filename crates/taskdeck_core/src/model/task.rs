//! Task record model and its partial shapes.
//!
//! # Responsibility
//! - Define the record exchanged with the remote store.
//! - Define create drafts and patch deltas, plus local delta merge.
//! - Enforce form-level title validation.
//!
//! # Invariants
//! - `TaskDraft` has no `id`; identity is assigned by the store.
//! - `created_at` is written by the store and only read by the client.

use crate::model::status::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned task identity.
pub type TaskId = i64;

/// Minimum title length, counted in characters after trimming.
pub const MIN_TITLE_CHARS: usize = 3;

/// Priority used when a draft does not specify one.
pub const DEFAULT_PRIORITY: i32 = 3;

/// Form-level validation failures. Never reach the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    TitleTooShort { min_chars: usize, actual_chars: usize },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::TitleTooShort {
                min_chars,
                actual_chars,
            } => write!(
                f,
                "title must have at least {min_chars} characters, got {actual_chars}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Checks the title rule shared by drafts and deltas.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let actual_chars = title.trim().chars().count();
    if actual_chars == 0 {
        return Err(ValidationError::EmptyTitle);
    }
    if actual_chars < MIN_TITLE_CHARS {
        return Err(ValidationError::TitleTooShort {
            min_chars: MIN_TITLE_CHARS,
            actual_chars,
        });
    }
    Ok(())
}

/// One task as known by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// `None` until the store acknowledges the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Used for ordering only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl TaskRecord {
    /// Builds the local placeholder shown while a create is in flight.
    ///
    /// `created_at` is stamped with `now` for display only; the store's value
    /// replaces it on commit.
    pub fn tentative(draft: &TaskDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            status: TaskStatus::Open,
            priority: draft.priority.unwrap_or(DEFAULT_PRIORITY),
            created_at: Some(now),
        }
    }
}

/// Create payload collected by the dialog. Carries no identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }
}

/// Partial update. Absent fields are left untouched.
///
/// An empty `description` clears the stored description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl TaskDelta {
    /// Delta that only changes status, as sent by status transitions.
    pub fn status_only(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.title.as_deref() {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }

    /// Merges this delta into `record` in place.
    pub fn apply_to(&self, record: &mut TaskRecord) {
        if let Some(title) = &self.title {
            record.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            record.description = if description.is_empty() {
                None
            } else {
                Some(description.clone())
            };
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
    }
}
