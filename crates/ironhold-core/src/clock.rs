//! The simulation clock.
//!
//! [`GameClock`] is the single source of truth for "now". Clones share one
//! atomic counter, so producers on other tasks can read the current time
//! while only the scheduler's run loop advances it.
//!
//! # Design Principles
//!
//! - Time never goes backwards; an attempt to rewind is an error.
//! - Reads are lock-free.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ironhold_types::GameTime;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The requested time is earlier than the current time.
    #[error("clock cannot move backwards from {current} to {requested}")]
    Backwards {
        /// The clock's current time.
        current: GameTime,
        /// The rejected target time.
        requested: GameTime,
    },
}

/// Shared, monotonic simulation clock.
#[derive(Debug, Clone, Default)]
pub struct GameClock {
    millis: Arc<AtomicU64>,
}

impl GameClock {
    /// A clock starting at [`GameTime::ZERO`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock starting at `start`.
    pub fn starting_at(start: GameTime) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start.as_millis())),
        }
    }

    /// The current simulation time.
    pub fn now(&self) -> GameTime {
        GameTime::from_millis(self.millis.load(Ordering::Acquire))
    }

    /// Move the clock forward to `target`. Advancing to the current time
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Backwards`] if `target` is in the past.
    pub(crate) fn advance_to(&self, target: GameTime) -> Result<GameTime, ClockError> {
        let current = self.now();
        if target < current {
            return Err(ClockError::Backwards {
                current,
                requested: target,
            });
        }
        self.millis.store(target.as_millis(), Ordering::Release);
        Ok(target)
    }
}
