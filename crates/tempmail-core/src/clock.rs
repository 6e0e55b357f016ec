//! Injectable wall clock.
//!
//! Cooldowns and uptime are measured against a [`Clock`] rather than calling
//! `Utc::now()` directly, so tests can drive time forward with [`ManualClock`].

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Cloning shares the underlying instant, so a test can hand one clone to the
/// engine and keep another to call [`ManualClock::advance`].
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(RwLock::new(start)) }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: std::time::Duration) {
        let delta = ChronoDuration::from_std(by).unwrap_or(ChronoDuration::MAX);
        let mut now = self.now.write();
        *now = now.checked_add_signed(delta).unwrap_or(*now);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Returns the non-negative elapsed time between `earlier` and `later`.
///
/// A clock that moved backwards yields zero rather than a negative span.
#[must_use]
pub fn elapsed_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> std::time::Duration {
    later.signed_duration_since(earlier).to_std().unwrap_or_default()
}
