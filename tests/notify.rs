#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tabtime::libs::notify::{Notification, NotificationPolicy, Notifier};
    use tabtime::libs::settings::Settings;

    /// Captures every notification instead of showing it.
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<Notification> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) -> Result<()> {
            self.sent.lock().push(notification);
            Ok(())
        }
    }

    /// A sink that always fails delivery.
    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _notification: Notification) -> Result<()> {
            anyhow::bail!("notification surface unavailable")
        }
    }

    fn policy() -> (Arc<RecordingNotifier>, NotificationPolicy) {
        let notifier = Arc::new(RecordingNotifier::default());
        let policy = NotificationPolicy::new(notifier.clone());
        (notifier, policy)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[tokio::test]
    async fn test_goal_fires_at_the_exact_boundary() {
        let (notifier, mut policy) = policy();
        let settings = Settings { daily_goal: 1.0, ..Settings::default() };
        let day = date(2026, 2, 10);

        policy.day_total_updated(day, 3599, &settings).await;
        assert!(notifier.sent().is_empty());

        policy.day_total_updated(day, 3600, &settings).await;
        assert_eq!(notifier.sent(), vec![Notification::DailyGoalReached { goal_hours: 1.0 }]);
    }

    #[tokio::test]
    async fn test_goal_fires_once_per_day() {
        let (notifier, mut policy) = policy();
        let settings = Settings { daily_goal: 1.0, ..Settings::default() };
        let day = date(2026, 2, 10);

        policy.day_total_updated(day, 3600, &settings).await;
        policy.day_total_updated(day, 7200, &settings).await;
        policy.day_total_updated(day, 10_000, &settings).await;
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_goal_fires_again_on_the_next_day() {
        let (notifier, mut policy) = policy();
        let settings = Settings { daily_goal: 1.0, ..Settings::default() };

        policy.day_total_updated(date(2026, 2, 10), 3600, &settings).await;
        policy.day_total_updated(date(2026, 2, 11), 3600, &settings).await;
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_goal_respects_the_toggles() {
        let (notifier, mut policy) = policy();
        let day = date(2026, 2, 10);

        let muted = Settings { daily_goal: 1.0, notifications: false, ..Settings::default() };
        policy.day_total_updated(day, 7200, &muted).await;
        assert!(notifier.sent().is_empty());

        let no_goal = Settings { daily_goal: 0.0, ..Settings::default() };
        policy.day_total_updated(day, 7200, &no_goal).await;
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_the_goal_latch() {
        let (notifier, mut policy) = policy();
        let settings = Settings { daily_goal: 1.0, ..Settings::default() };
        let day = date(2026, 2, 10);

        policy.day_total_updated(day, 3600, &settings).await;
        policy.reset_goal_latch();
        policy.day_total_updated(day, 3600, &settings).await;
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_break_reminder_fires_after_the_interval() {
        let (notifier, mut policy) = policy();
        let settings = Settings { break_interval: 1, ..Settings::default() };
        let start = Instant::now();
        policy.resume(start);

        policy.break_tick(start + Duration::from_secs(59), &settings).await;
        assert!(notifier.sent().is_empty());

        policy.break_tick(start + Duration::from_secs(60), &settings).await;
        assert_eq!(notifier.sent(), vec![Notification::BreakReminder { interval_minutes: 1 }]);
    }

    #[tokio::test]
    async fn test_break_reminder_interval_restarts_after_firing() {
        let (notifier, mut policy) = policy();
        let settings = Settings { break_interval: 1, ..Settings::default() };
        let start = Instant::now();
        policy.resume(start);

        policy.break_tick(start + Duration::from_secs(60), &settings).await;
        policy.break_tick(start + Duration::from_secs(119), &settings).await;
        assert_eq!(notifier.sent().len(), 1);

        policy.break_tick(start + Duration::from_secs(120), &settings).await;
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_suspend_freezes_break_progress() {
        let (notifier, mut policy) = policy();
        let settings = Settings { break_interval: 1, ..Settings::default() };
        let start = Instant::now();

        policy.resume(start);
        policy.suspend(start + Duration::from_secs(30));

        // Time while suspended never counts, no matter how long.
        policy.break_tick(start + Duration::from_secs(5000), &settings).await;
        assert!(notifier.sent().is_empty());

        policy.resume(start + Duration::from_secs(5000));
        policy.break_tick(start + Duration::from_secs(5029), &settings).await;
        assert!(notifier.sent().is_empty());

        policy.break_tick(start + Duration::from_secs(5030), &settings).await;
        assert_eq!(notifier.sent().len(), 1, "30 frozen seconds plus 30 fresh ones should complete the minute");
    }

    #[tokio::test]
    async fn test_break_crossing_consumes_the_interval_even_when_muted() {
        let (notifier, mut policy) = policy();
        let start = Instant::now();
        policy.resume(start);

        let muted = Settings { break_interval: 1, break_reminder: false, ..Settings::default() };
        policy.break_tick(start + Duration::from_secs(60), &muted).await;
        assert!(notifier.sent().is_empty());

        // Re-enabling right after the crossing starts a fresh interval
        // instead of firing for the consumed one.
        let audible = Settings { break_interval: 1, ..Settings::default() };
        policy.break_tick(start + Duration::from_secs(61), &audible).await;
        assert!(notifier.sent().is_empty());

        policy.break_tick(start + Duration::from_secs(120), &audible).await;
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_break_interval_never_fires() {
        let (notifier, mut policy) = policy();
        let settings = Settings { break_interval: 0, ..Settings::default() };
        let start = Instant::now();
        policy.resume(start);

        policy.break_tick(start + Duration::from_secs(864_000), &settings).await;
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_absurd_break_interval_saturates_instead_of_overflowing() {
        let (notifier, mut policy) = policy();
        // Stored settings are host data; a nonsense value must not panic
        // the minute-to-second conversion.
        let settings = Settings { break_interval: u64::MAX, ..Settings::default() };
        let start = Instant::now();
        policy.resume(start);

        policy.break_tick(start + Duration::from_secs(864_000), &settings).await;
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_goal_latch_holds_even_when_delivery_fails() {
        let mut policy = NotificationPolicy::new(Arc::new(FailingNotifier));
        let settings = Settings { daily_goal: 1.0, ..Settings::default() };
        let day = date(2026, 2, 10);

        // Both calls survive the failing sink; the second is latched out.
        policy.day_total_updated(day, 3600, &settings).await;
        policy.day_total_updated(day, 7200, &settings).await;
    }

    #[test]
    fn test_notification_copy() {
        let goal = Notification::DailyGoalReached { goal_hours: 8.0 };
        assert_eq!(goal.title(), "Daily goal reached");
        assert!(goal.body().contains("8.0h"), "the goal body shows the goal as formatted hours: {}", goal.body());

        let reminder = Notification::BreakReminder { interval_minutes: 60 };
        assert_eq!(reminder.title(), "Time for a break");
        assert!(reminder.body().contains("1h 0m 0s"), "the reminder body shows the formatted interval: {}", reminder.body());

        let short = Notification::BreakReminder { interval_minutes: 30 };
        assert!(short.body().contains("30m 0s"));
    }
}
