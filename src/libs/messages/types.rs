/// Structured catalog of everything the crate logs or shows to users.
///
/// Keeping the text in one place keeps wording consistent between log
/// lines and notification bodies, and leaves room for localization later.
#[derive(Debug, Clone)]
pub enum Message {
    // === TRACKING MESSAGES ===
    TrackingStarted(String),          // domain
    TrackingPaused(String, String),   // domain, cause
    TrackingResumed(String),          // domain
    TrackingStopped(String),          // domain
    TrackingEnabled,
    TrackingDisabled,
    DomainExcluded(String), // domain
    TabUnresolvable,

    // === SESSION MESSAGES ===
    SessionFlushFailed(String, String), // domain, error
    SessionDiscarded(String, u64),      // domain, unsaved seconds

    // === NOTIFICATION MESSAGES ===
    DailyGoalReached(f64), // goal hours
    BreakReminderDue(u64), // interval minutes
    NotificationFailed(String),

    // === USAGE MESSAGES ===
    UsageReset,
    UsagePruned(usize, String), // removed days, cutoff day
    MirrorRebuilt(String),      // day

    // === SETTINGS MESSAGES ===
    SettingsLoadFailed(String),
    SettingsDecodeFailed(String),
    SettingsSaved,

    // === MONITOR MESSAGES ===
    MonitorStarted,
    MonitorStopped,
    ForegroundProbeFailed(String),
}
