//! Notification policy and the host notification sink.
//!
//! The core decides *when* a notification is due; the host decides how to
//! show it. Two kinds exist: a daily goal notice that fires at most once
//! per calendar day, and a periodic break reminder driven by its own
//! accumulator of tracking-enabled time.
//!
//! The break accumulator deliberately ignores pauses, resumes and tab
//! switches: it counts wall time while tracking is enabled, freezes when
//! tracking is disabled, and resets only when a reminder interval is
//! consumed. Delivery failures are logged and forgotten; the worst symptom
//! of a broken sink is a missed notification.

use crate::libs::messages::Message;
use crate::libs::settings::Settings;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A user-facing notification the policy wants shown.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Today's total browsing time crossed the daily goal.
    DailyGoalReached { goal_hours: f64 },
    /// Tracked time since the last reminder crossed the break interval.
    BreakReminder { interval_minutes: u64 },
}

impl Notification {
    /// Short title for the host's notification surface.
    pub fn title(&self) -> &'static str {
        match self {
            Notification::DailyGoalReached { .. } => "Daily goal reached",
            Notification::BreakReminder { .. } => "Time for a break",
        }
    }

    /// Body text for the host's notification surface.
    pub fn body(&self) -> String {
        match self {
            Notification::DailyGoalReached { goal_hours } => Message::DailyGoalReached(*goal_hours).to_string(),
            Notification::BreakReminder { interval_minutes } => Message::BreakReminderDue(*interval_minutes).to_string(),
        }
    }
}

/// Host-provided notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<()>;
}

/// Decides when goal and break notifications fire.
pub struct NotificationPolicy {
    notifier: Arc<dyn Notifier>,
    /// Day the goal notice last fired for; at most one per calendar day.
    goal_notified_on: Option<NaiveDate>,
    /// Break progress accumulated before the current counting span.
    break_accrued: Duration,
    /// Start of the current counting span; `None` while tracking is disabled.
    break_since: Option<Instant>,
}

impl NotificationPolicy {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            goal_notified_on: None,
            break_accrued: Duration::ZERO,
            break_since: None,
        }
    }

    /// Goal check after a posting left `day` at `day_total_seconds`.
    pub async fn day_total_updated(&mut self, day: NaiveDate, day_total_seconds: u64, settings: &Settings) {
        if !settings.notifications || settings.daily_goal <= 0.0 {
            return;
        }
        let hours = day_total_seconds as f64 / 3600.0;
        if hours < settings.daily_goal || self.goal_notified_on == Some(day) {
            return;
        }
        // Latch before sending: a failed delivery is not retried.
        self.goal_notified_on = Some(day);
        self.send(Notification::DailyGoalReached {
            goal_hours: settings.daily_goal,
        })
        .await;
    }

    /// Starts counting tracking-enabled time. No-op while already counting.
    pub fn resume(&mut self, now: Instant) {
        if self.break_since.is_none() {
            self.break_since = Some(now);
        }
    }

    /// Freezes the accumulator, keeping progress made so far.
    pub fn suspend(&mut self, now: Instant) {
        if let Some(since) = self.break_since.take() {
            self.break_accrued += now.saturating_duration_since(since);
        }
    }

    /// Periodic break check. A crossing always consumes the interval;
    /// settings toggles gate only whether the reminder is actually sent.
    pub async fn break_tick(&mut self, now: Instant, settings: &Settings) {
        if self.break_since.is_none() {
            return;
        }
        let interval = Duration::from_secs(settings.break_interval.saturating_mul(60));
        if interval.is_zero() || self.break_elapsed(now) < interval {
            return;
        }
        self.break_accrued = Duration::ZERO;
        self.break_since = Some(now);
        if settings.notifications && settings.break_reminder {
            self.send(Notification::BreakReminder {
                interval_minutes: settings.break_interval,
            })
            .await;
        }
    }

    /// Clears the daily goal latch, used when usage data is wiped.
    pub fn reset_goal_latch(&mut self) {
        self.goal_notified_on = None;
    }

    fn break_elapsed(&self, now: Instant) -> Duration {
        match self.break_since {
            Some(since) => self.break_accrued + now.saturating_duration_since(since),
            None => self.break_accrued,
        }
    }

    async fn send(&self, notification: Notification) {
        debug!(title = notification.title(), "notification requested");
        if let Err(err) = self.notifier.notify(notification).await {
            warn!("{}", Message::NotificationFailed(err.to_string()));
        }
    }
}
