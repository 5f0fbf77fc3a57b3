//! Locally materialized task list: one page window, its order and filter.
//!
//! # Responsibility
//! - Hold the records of the currently loaded page.
//! - Derive the filtered view and the pagination estimate.
//!
//! # Invariants
//! - Entries are only mutated through the reconciliation engine.
//! - Filtering never fetches or fabricates records outside the loaded page.

pub mod estimator;
pub mod recency;
pub mod state;
