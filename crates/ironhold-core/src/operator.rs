//! Operator control state for the run loop.
//!
//! Shared atomic state used by the run loop and whoever controls it (the
//! engine binary's signal handler, tests). The operator can request a
//! clean stop without tearing the loop down mid-operation.
//!
//! # Architecture
//!
//! The stop flag is an atomic, so the run loop reads it without locks.
//! [`Notify`] wakes the loop out of an idle sleep.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

/// Reason why the run loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEndReason {
    /// An operator issued a stop command.
    OperatorStop,
    /// Reached the configured `max_run_seconds` limit.
    TimeLimitReached,
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the loop out of an idle sleep when a stop is requested.
    stop_notify: Notify,

    /// Wall-clock time when the run started.
    started_at: DateTime<Utc>,

    /// Maximum wall-clock seconds (0 = unlimited).
    max_run_seconds: u64,

    /// Reason the run ended, if it has.
    end_reason: Mutex<Option<RunEndReason>>,
}

impl OperatorState {
    /// Create operator state with a wall-clock limit (0 = unlimited).
    pub fn new(max_run_seconds: u64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            started_at: Utc::now(),
            max_run_seconds,
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.stop_notify.notified().await;
        }
    }

    /// Record the reason the run ended.
    pub async fn set_end_reason(&self, reason: RunEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Get the reason the run ended, if it has.
    pub async fn end_reason(&self) -> Option<RunEndReason> {
        self.end_reason.lock().await.clone()
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Whether the wall-clock limit has been reached.
    pub fn time_limit_reached(&self) -> bool {
        self.max_run_seconds > 0 && self.elapsed_seconds() >= self.max_run_seconds
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Elapsed wall-clock seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now().signed_duration_since(self.started_at).num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// The configured wall-clock limit.
    pub const fn max_run_seconds(&self) -> u64 {
        self.max_run_seconds
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn initial_state_is_running() {
        let state = OperatorState::new(0);
        assert!(!state.is_stop_requested());
        assert!(!state.time_limit_reached());
    }

    #[test]
    fn time_limit_counts_whole_seconds() {
        let state = OperatorState::new(3600);
        assert_eq!(state.max_run_seconds(), 3600);
        assert!(!state.time_limit_reached());
    }

    #[tokio::test]
    async fn stopped_resolves_after_request() {
        let state = Arc::new(OperatorState::new(0));
        let waiter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.stopped().await })
        };
        state.request_stop();
        assert!(waiter.await.is_ok());
        state.set_end_reason(RunEndReason::OperatorStop).await;
        assert_eq!(state.end_reason().await, Some(RunEndReason::OperatorStop));
    }
}
