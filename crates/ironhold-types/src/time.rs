//! Simulation time.
//!
//! [`GameTime`] is a millisecond count since the simulation started. It is
//! advanced only by the scheduler's run loop and never goes backwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A point on the simulation clock, in milliseconds since start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameTime(u64);

impl GameTime {
    /// The instant the simulation starts.
    pub const ZERO: Self = Self(0);

    /// Build a time from a millisecond count.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Return the millisecond count.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Add a duration, saturating at the far end of the clock.
    pub fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration_to_millis(duration)))
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is in the future.
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// Time remaining until `later`, or zero if `later` has passed.
    pub const fn saturating_duration_until(self, later: Self) -> Duration {
        later.saturating_duration_since(self)
    }
}

impl core::fmt::Display for GameTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Convert a [`Duration`] to whole milliseconds, saturating at `u64::MAX`.
pub fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
