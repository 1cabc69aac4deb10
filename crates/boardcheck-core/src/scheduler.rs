//! Cooperative "due since last tick" checks
//!
//! The main loop runs three independent periodic jobs without threads or
//! timers: each job owns a [`Periodic`] and asks it whether enough time has
//! passed since the last time it ran.

use embassy_time::{Duration, Instant};

/// Tracks when a periodic job last ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periodic {
    interval: Duration,
    last: Option<Instant>,
}

impl Periodic {
    /// A job that has never run; the first poll is always due.
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns `true` and records `now` when strictly more than the interval
    /// has passed since the last run.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    /// Whether the job is due, without recording anything.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last {
            Some(last) => now.saturating_duration_since(last) > self.interval,
            None => true,
        }
    }

    pub fn last(&self) -> Option<Instant> {
        self.last
    }
}
