//! Task domain model shared by the list engine and store adapters.
//!
//! # Responsibility
//! - Define the canonical task record and its partial shapes (draft/delta).
//! - Centralize status transition legality in one table.
//!
//! # Invariants
//! - A record's `id` is assigned by the remote store only, never by the client.
//! - Titles are validated before any remote call is attempted.

pub mod status;
pub mod task;
