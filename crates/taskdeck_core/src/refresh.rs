//! Periodic no-op refresh that keeps relative timestamps current.
//!
//! # Invariants
//! - The tick callback never touches list data; it only requests a re-render.
//! - Stopping is unconditional: `stop()` and `Drop` both abort the task.

use log::debug;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Scheduled re-render tied to the lifetime of one view.
#[derive(Debug)]
pub struct RefreshTicker {
    handle: Option<JoinHandle<()>>,
}

impl RefreshTicker {
    /// Spawns the ticker on the current tokio runtime.
    ///
    /// The first tick fires one `period` after start.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                on_tick();
            }
        });
        debug!(
            "event=refresh_start module=refresh status=ok period_ms={}",
            period.as_millis()
        );
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancels the ticker. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("event=refresh_stop module=refresh status=ok");
        }
    }
}

impl Drop for RefreshTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
