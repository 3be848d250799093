//! Time sources for session accounting.
//!
//! Every time read in the tracking core goes through the [`Clock`] trait so
//! tests can drive the monitor deterministically. [`SystemClock`] is the
//! production source. [`ManualClock`] is a hand-advanced source whose clones
//! share state, letting a test move time while the code under test reads it.

use chrono::{DateTime, Duration, Local, NaiveDate};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic instant for interval measurement.
    fn instant(&self) -> Instant;

    /// Local wall-clock time, used to attribute usage to calendar days.
    fn now(&self) -> DateTime<Local>;

    /// Local calendar date of `now`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Production clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Hand-advanced clock for deterministic tests.
#[derive(Clone)]
pub struct ManualClock {
    base_instant: Instant,
    base_now: DateTime<Local>,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Creates a clock frozen at the given wall-clock time.
    pub fn starting_at(now: DateTime<Local>) -> Self {
        Self {
            base_instant: Instant::now(),
            base_now: now,
            offset: Arc::new(Mutex::new(Duration::zero())),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock();
        *offset += by;
    }

    /// Moves the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    /// Moves the clock backward, simulating a wall-clock step.
    pub fn rewind_secs(&self, secs: i64) {
        self.advance(Duration::seconds(-secs));
    }
}

impl Clock for ManualClock {
    fn instant(&self) -> Instant {
        let offset = *self.offset.lock();
        // An Instant cannot move backward, so negative offsets saturate here.
        match offset.to_std() {
            Ok(forward) => self.base_instant + forward,
            Err(_) => self.base_instant,
        }
    }

    fn now(&self) -> DateTime<Local> {
        self.base_now + *self.offset.lock()
    }
}
