//! Contracts for the UI collaborators the controller talks to.
//!
//! # Responsibility
//! - Dialog: collect create/edit values and destructive-action confirmation.
//! - Notifier: render ephemeral pass/fail messages.
//!
//! # Invariants
//! - A cancelled dialog returns `None` and must cause no state change.
//! - Notifications are fire-and-forget.

use crate::model::task::{TaskDelta, TaskDraft, TaskRecord};

pub trait TaskDialog {
    /// Returns the draft to create, or `None` when cancelled.
    fn open_create(&self) -> Option<TaskDraft>;
    /// Returns the fields to change on `record`, or `None` when cancelled.
    fn open_edit(&self, record: &TaskRecord) -> Option<TaskDelta>;
    fn confirm_destructive(&self, title: &str, message: &str) -> bool;
}

pub trait Notifier {
    fn notify(&self, message: &str, duration_ms: u64);
}

impl<T: TaskDialog + ?Sized> TaskDialog for &T {
    fn open_create(&self) -> Option<TaskDraft> {
        (**self).open_create()
    }

    fn open_edit(&self, record: &TaskRecord) -> Option<TaskDelta> {
        (**self).open_edit(record)
    }

    fn confirm_destructive(&self, title: &str, message: &str) -> bool {
        (**self).confirm_destructive(title, message)
    }
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify(&self, message: &str, duration_ms: u64) {
        (**self).notify(message, duration_ms);
    }
}
