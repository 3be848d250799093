//! Display implementation for tabtime messages.
//!
//! The single source of truth for all user-facing and log-facing text.
//! Message variants carry typed parameters; this implementation turns them
//! into sentences. Text follows sentence case, active voice and includes
//! the concrete parameter values that make a line actionable.

use super::types::Message;
use crate::libs::formatter::{format_hours, format_seconds};
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === TRACKING MESSAGES ===
            Message::TrackingStarted(domain) => format!("Tracking started for {}", domain),
            Message::TrackingPaused(domain, cause) => format!("Tracking paused for {} ({})", domain, cause),
            Message::TrackingResumed(domain) => format!("Tracking resumed for {}", domain),
            Message::TrackingStopped(domain) => format!("Tracking stopped for {}", domain),
            Message::TrackingEnabled => "Tracking enabled".to_string(),
            Message::TrackingDisabled => "Tracking disabled; open session closed".to_string(),
            Message::DomainExcluded(domain) => format!("{} is excluded from tracking", domain),
            Message::TabUnresolvable => "Foreground tab has no trackable domain".to_string(),

            // === SESSION MESSAGES ===
            Message::SessionFlushFailed(domain, error) => format!("Failed to save elapsed time for {}: {}", domain, error),
            Message::SessionDiscarded(domain, seconds) => format!("Discarded {} of unsaved time for now-excluded {}", format_seconds(*seconds), domain),

            // === NOTIFICATION MESSAGES ===
            Message::DailyGoalReached(hours) => format!(
                "You have reached your daily goal of {} of browsing",
                format_hours((hours * 3600.0).round() as u64)
            ),
            Message::BreakReminderDue(minutes) => format!(
                "You have been browsing for {}. Time to take a break!",
                format_seconds(minutes.saturating_mul(60))
            ),
            Message::NotificationFailed(error) => format!("Failed to deliver notification: {}", error),

            // === USAGE MESSAGES ===
            Message::UsageReset => "All usage data has been reset".to_string(),
            Message::UsagePruned(days, cutoff) => format!("Pruned {} day(s) of usage older than {}", days, cutoff),
            Message::MirrorRebuilt(day) => format!("Rebuilt today snapshot for {}", day),

            // === SETTINGS MESSAGES ===
            Message::SettingsLoadFailed(error) => format!("Failed to load settings, using defaults: {}", error),
            Message::SettingsDecodeFailed(error) => format!("Failed to parse stored settings, using defaults: {}", error),
            Message::SettingsSaved => "Settings saved".to_string(),

            // === MONITOR MESSAGES ===
            Message::MonitorStarted => "Usage monitor started".to_string(),
            Message::MonitorStopped => "Usage monitor stopped".to_string(),
            Message::ForegroundProbeFailed(error) => format!("Could not resolve the current tab: {}", error),
        };
        write!(f, "{}", text)
    }
}
