//! Idle detection from observed host activity.
//!
//! The tracking core never sees raw input devices; the stream of host
//! events itself is the activity signal. Every tab or focus event counts as
//! user activity. When no event arrives for the configured threshold, the
//! open session is considered idle and pauses until the next event.

use std::time::{Duration, Instant};

/// Tracks the gap since the last observed user activity.
pub struct IdleDetector {
    threshold: Duration,
    last_activity: Instant,
    idle: bool,
}

impl IdleDetector {
    /// Creates a detector with the threshold in minutes. A zero threshold
    /// disables idle detection entirely.
    pub fn new(threshold_minutes: u64, now: Instant) -> Self {
        Self {
            threshold: Duration::from_secs(threshold_minutes.saturating_mul(60)),
            last_activity: now,
            idle: false,
        }
    }

    /// Records user activity. Returns `true` when this ends an idle spell.
    pub fn touch(&mut self, now: Instant) -> bool {
        let was_idle = self.idle;
        self.idle = false;
        self.last_activity = now;
        was_idle
    }

    /// Checks the threshold. Returns `true` when this crosses into idle.
    pub fn check(&mut self, now: Instant) -> bool {
        if self.idle || self.threshold.is_zero() {
            return false;
        }
        if now.saturating_duration_since(self.last_activity) >= self.threshold {
            self.idle = true;
            return true;
        }
        false
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Applies a new threshold from settings, in minutes.
    pub fn set_threshold(&mut self, minutes: u64) {
        self.threshold = Duration::from_secs(minutes.saturating_mul(60));
    }
}
