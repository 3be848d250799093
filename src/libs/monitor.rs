//! Activity monitoring state machine for browsing sessions.
//!
//! `Monitor` consumes an ordered stream of host events (tab changes, window
//! focus, settings updates and read requests) and maintains at most one
//! open session at a time, attributed to the domain of the foreground tab.
//! A one-second session clock, armed only while a session is accruing,
//! moves elapsed whole seconds into the usage ledger and drives idle
//! detection.
//!
//! ## Event model
//!
//! Events are processed one at a time, in arrival order, with no timer
//! firing between the steps of a single transition. The host owns event
//! production; the monitor owns every transition. Reads are answered over
//! oneshot channels carried inside the event stream, so they always
//! observe a consistent state.
//!
//! ## Accounting discipline
//!
//! Each tick posts `floor(now - reference)` seconds to the ledger and then
//! advances the reference by exactly the posted amount, so fractional
//! remainders carry into the next tick and the sum of postings equals the
//! floor of real elapsed time. A failed posting leaves the reference
//! untouched; the next tick retries the combined amount. Sessions spanning
//! midnight post to the day the interval started in.
//!
//! ## Failure posture
//!
//! Nothing here stops the loop. Store failures are logged and retried
//! through the reference discipline, settings failures fall back to
//! defaults, and notification failures cost at most the notification.

use crate::libs::clock::{Clock, SystemClock};
use crate::libs::event::{resolve_domain, HostEvent, Request, TabProvider};
use crate::libs::idle::IdleDetector;
use crate::libs::ledger::UsageLedger;
use crate::libs::messages::Message;
use crate::libs::notify::{NotificationPolicy, Notifier};
use crate::libs::settings::Settings;
use crate::store::kv::KvStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Buffer size of the host event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Timer cadences for the monitor loop.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Period of the session clock that posts elapsed seconds.
    pub tick_interval: Duration,
    /// Period of the break reminder check.
    pub break_check_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            tick_interval: Duration::from_secs(1),
            break_check_interval: Duration::from_secs(1),
        }
    }
}

/// Why an open session stopped accruing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PauseCause {
    FocusLost,
    UserIdle,
}

impl PauseCause {
    fn as_str(self) -> &'static str {
        match self {
            PauseCause::FocusLost => "window unfocused",
            PauseCause::UserIdle => "user idle",
        }
    }
}

/// Session state. At most one session exists at any time.
#[derive(Debug)]
enum TrackState {
    /// No session open.
    Idle,
    /// Open session accruing time since `reference`.
    Tracking { domain: String, reference: DateTime<Local> },
    /// Open session retained but not accruing.
    Paused { domain: String, cause: PauseCause },
}

/// Snapshot of the monitor's externally visible state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingStatus {
    /// Whether a session is currently accruing time.
    pub is_tracking: bool,
    /// Domain of the open session, accruing or paused.
    pub active_domain: Option<String>,
    /// Whether the user is considered idle.
    pub is_idle: bool,
}

/// The activity monitor.
///
/// Owns the session state machine, the idle detector, the usage ledger and
/// the notification policy. Drive it either through [`Monitor::run`] with
/// an event channel, or manually with [`Monitor::startup`],
/// [`Monitor::handle_event`], [`Monitor::tick`] and [`Monitor::break_tick`]
/// on hosts without their own timer wiring.
pub struct Monitor {
    config: MonitorConfig,
    settings: Settings,
    state: TrackState,
    ledger: UsageLedger,
    idle: IdleDetector,
    policy: NotificationPolicy,
    tabs: Arc<dyn TabProvider>,
    clock: Arc<dyn Clock>,
    window_focused: bool,
    /// Bumped on every session open so the run loop re-arms the session
    /// clock with a fresh phase.
    session_epoch: u64,
    last_pruned: Option<NaiveDate>,
}

impl Monitor {
    /// Creates a monitor over the two storage areas and the host adapters,
    /// loading settings from the settings area.
    pub async fn new(
        config: MonitorConfig,
        usage_store: Arc<dyn KvStore>,
        settings_store: Arc<dyn KvStore>,
        tabs: Arc<dyn TabProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_clock(config, usage_store, settings_store, tabs, notifier, Arc::new(SystemClock)).await
    }

    /// Same as [`Monitor::new`] with an explicit time source.
    pub async fn with_clock(
        config: MonitorConfig,
        usage_store: Arc<dyn KvStore>,
        settings_store: Arc<dyn KvStore>,
        tabs: Arc<dyn TabProvider>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = Settings::load(settings_store.as_ref()).await;
        let idle = IdleDetector::new(settings.idle_threshold, clock.instant());
        let ledger = UsageLedger::new(usage_store, clock.clone());
        let policy = NotificationPolicy::new(notifier);
        Monitor {
            config,
            settings,
            state: TrackState::Idle,
            ledger,
            idle,
            policy,
            tabs,
            clock,
            window_focused: true,
            session_epoch: 0,
            last_pruned: None,
        }
    }

    /// Runs the monitor until the event stream closes or
    /// [`HostEvent::Shutdown`] arrives, then flushes the open session.
    ///
    /// Timers are owned by this loop: the session clock exists only while a
    /// session is accruing, the break clock only while tracking is enabled.
    pub async fn run(&mut self, mut events: mpsc::Receiver<HostEvent>) -> Result<()> {
        info!("{}", Message::MonitorStarted);
        self.startup().await;
        let mut session_clock: Option<Interval> = None;
        let mut break_clock: Option<Interval> = None;
        let mut armed_epoch = self.session_epoch;
        loop {
            self.rearm(&mut armed_epoch, &mut session_clock, &mut break_clock);
            tokio::select! {
                maybe_event = events.recv() => match maybe_event {
                    Some(HostEvent::Shutdown) | None => break,
                    Some(event) => self.handle_event(event).await,
                },
                _ = next_tick(&mut session_clock) => self.tick().await,
                _ = next_tick(&mut break_clock) => self.break_tick().await,
            }
        }
        self.close_session().await;
        info!("{}", Message::MonitorStopped);
        Ok(())
    }

    /// Startup duties: prune old usage and resolve the current foreground
    /// tab, so a restart does not wait for the next tab event.
    ///
    /// [`Monitor::run`] calls this; call it once yourself when driving the
    /// monitor manually.
    pub async fn startup(&mut self) {
        self.prune_usage().await;
        if self.settings.tracking_enabled {
            self.policy.resume(self.clock.instant());
            if self.settings.auto_start {
                self.probe_foreground_tab().await;
            }
        }
    }

    /// Applies one host event. Every tab or focus event also counts as
    /// user activity for idle detection.
    pub async fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::TabChanged { url } => {
                self.note_activity();
                self.apply_tab(url.as_deref()).await;
            }
            HostEvent::WindowFocus { focused } => {
                self.note_activity();
                self.apply_window_focus(focused).await;
            }
            HostEvent::SettingsChanged(settings) => self.apply_settings(settings).await,
            HostEvent::Request(request) => self.answer(request).await,
            HostEvent::Shutdown => {}
        }
    }

    /// One step of the session clock. Checks the idle threshold first,
    /// then posts elapsed whole seconds.
    pub async fn tick(&mut self) {
        if self.idle.check(self.clock.instant()) {
            self.pause_session(PauseCause::UserIdle).await;
            return;
        }
        let (domain, reference) = match &self.state {
            TrackState::Tracking { domain, reference } => (domain.clone(), *reference),
            _ => return,
        };
        if let Some(posted) = self.flush_elapsed(&domain, reference).await {
            if let TrackState::Tracking { reference, .. } = &mut self.state {
                *reference += chrono::Duration::seconds(posted as i64);
            }
        }
        self.maybe_prune().await;
    }

    /// One step of the break reminder clock.
    pub async fn break_tick(&mut self) {
        let now = self.clock.instant();
        self.policy.break_tick(now, &self.settings).await;
    }

    /// Current externally visible state.
    pub fn status(&self) -> TrackingStatus {
        let (is_tracking, active_domain) = match &self.state {
            TrackState::Idle => (false, None),
            TrackState::Tracking { domain, .. } => (true, Some(domain.clone())),
            TrackState::Paused { domain, .. } => (false, Some(domain.clone())),
        };
        TrackingStatus {
            is_tracking,
            active_domain,
            is_idle: self.idle.is_idle(),
        }
    }

    /// Reconciles timer existence with the current state. Arming always
    /// starts a fresh interval, so a reopened session never inherits a
    /// stale tick phase.
    fn rearm(&self, armed_epoch: &mut u64, session_clock: &mut Option<Interval>, break_clock: &mut Option<Interval>) {
        let accruing = matches!(self.state, TrackState::Tracking { .. });
        if !accruing {
            *session_clock = None;
        } else if session_clock.is_none() || *armed_epoch != self.session_epoch {
            *session_clock = Some(new_interval(self.config.tick_interval));
            *armed_epoch = self.session_epoch;
        }

        if !self.settings.tracking_enabled {
            *break_clock = None;
        } else if break_clock.is_none() {
            *break_clock = Some(new_interval(self.config.break_check_interval));
        }
    }

    /// Marks user activity; ends an idle pause if one is in effect.
    fn note_activity(&mut self) {
        let resumed = self.idle.touch(self.clock.instant());
        if !resumed {
            return;
        }
        if let TrackState::Paused { domain, cause: PauseCause::UserIdle } = &self.state {
            let domain = domain.clone();
            if self.window_focused {
                self.resume_session(domain);
            } else {
                self.state = TrackState::Paused {
                    domain,
                    cause: PauseCause::FocusLost,
                };
            }
        }
    }

    /// The tab rule: flush and close any open session, then open a new one
    /// when the URL resolves to a trackable, non-excluded domain.
    async fn apply_tab(&mut self, url: Option<&str>) {
        let domain = match url.and_then(resolve_domain) {
            Some(domain) => domain,
            None => {
                if url.is_some() {
                    debug!("{}", Message::TabUnresolvable);
                }
                self.close_session().await;
                return;
            }
        };
        if !self.settings.tracking_enabled {
            self.close_session().await;
            return;
        }
        if self.settings.is_excluded(&domain) {
            debug!("{}", Message::DomainExcluded(domain.clone()));
            self.close_session().await;
            return;
        }
        self.close_session().await;
        self.open_session(domain);
    }

    async fn apply_window_focus(&mut self, focused: bool) {
        self.window_focused = focused;
        if focused {
            if let TrackState::Paused { domain, cause: PauseCause::FocusLost } = &self.state {
                let domain = domain.clone();
                self.resume_session(domain);
            }
        } else {
            self.pause_session(PauseCause::FocusLost).await;
        }
    }

    /// Applies a settings snapshot: updates the idle threshold, stops or
    /// restarts tracking on the master switch, and drops the open session
    /// without posting when its domain becomes excluded.
    async fn apply_settings(&mut self, settings: Settings) {
        self.idle.set_threshold(settings.idle_threshold);

        // An exclusion added for the open session's domain wins over the
        // flush: the unsaved tail is dropped, not posted under new rules.
        let active_domain = match &self.state {
            TrackState::Tracking { domain, .. } | TrackState::Paused { domain, .. } => Some(domain.clone()),
            TrackState::Idle => None,
        };
        if let Some(domain) = active_domain {
            if settings.is_excluded(&domain) {
                let discarded = self.unposted_seconds();
                info!("{}", Message::SessionDiscarded(domain, discarded));
                self.state = TrackState::Idle;
            }
        }

        let was_enabled = self.settings.tracking_enabled;
        if was_enabled && !settings.tracking_enabled {
            info!("{}", Message::TrackingDisabled);
            self.close_session().await;
            self.policy.suspend(self.clock.instant());
        }

        let became_enabled = !was_enabled && settings.tracking_enabled;
        self.settings = settings;

        if became_enabled {
            info!("{}", Message::TrackingEnabled);
            self.policy.resume(self.clock.instant());
            if self.settings.auto_start && matches!(self.state, TrackState::Idle) {
                self.probe_foreground_tab().await;
            }
        }
    }

    /// Answers a read or control request. Replies whose receiver is gone
    /// are dropped silently.
    async fn answer(&mut self, request: Request) {
        match request {
            Request::SessionSeconds(reply) => {
                let _ = reply.send(self.unposted_seconds());
            }
            Request::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Request::Settings(reply) => {
                let _ = reply.send(self.settings.clone());
            }
            Request::ResetAllData(reply) => {
                let _ = reply.send(self.reset_all_data().await);
            }
        }
    }

    /// Wipes usage data. An open session survives with a fresh reference,
    /// so nothing accrued before the wipe leaks into the empty ledger.
    async fn reset_all_data(&mut self) -> Result<()> {
        self.ledger.reset().await?;
        self.policy.reset_goal_latch();
        if let TrackState::Tracking { reference, .. } = &mut self.state {
            *reference = self.clock.now();
        }
        Ok(())
    }

    /// Opens a session for `domain`. With the window unfocused the session
    /// starts paused and begins accruing on the next focus gain.
    fn open_session(&mut self, domain: String) {
        if self.window_focused {
            info!("{}", Message::TrackingStarted(domain.clone()));
            self.state = TrackState::Tracking {
                domain,
                reference: self.clock.now(),
            };
            self.session_epoch = self.session_epoch.wrapping_add(1);
        } else {
            info!("{}", Message::TrackingPaused(domain.clone(), PauseCause::FocusLost.as_str().to_string()));
            self.state = TrackState::Paused {
                domain,
                cause: PauseCause::FocusLost,
            };
        }
    }

    /// Reopens a paused session with a fresh reference timestamp. Paused
    /// time stays unaccounted.
    fn resume_session(&mut self, domain: String) {
        info!("{}", Message::TrackingResumed(domain.clone()));
        self.state = TrackState::Tracking {
            domain,
            reference: self.clock.now(),
        };
        self.session_epoch = self.session_epoch.wrapping_add(1);
    }

    /// Flushes and stops accruing while keeping the session open.
    async fn pause_session(&mut self, cause: PauseCause) {
        if let TrackState::Tracking { domain, reference } = &self.state {
            let (domain, reference) = (domain.clone(), *reference);
            self.flush_elapsed(&domain, reference).await;
            info!("{}", Message::TrackingPaused(domain.clone(), cause.as_str().to_string()));
            self.state = TrackState::Paused { domain, cause };
        }
    }

    /// Flushes accrued whole seconds and returns to `Idle`. A flush
    /// failure is logged and the fragment dropped; the session still
    /// closes.
    async fn close_session(&mut self) {
        match std::mem::replace(&mut self.state, TrackState::Idle) {
            TrackState::Idle => {}
            TrackState::Paused { domain, .. } => {
                debug!("{}", Message::TrackingStopped(domain));
            }
            TrackState::Tracking { domain, reference } => {
                self.flush_elapsed(&domain, reference).await;
                info!("{}", Message::TrackingStopped(domain));
            }
        }
    }

    /// Posts `floor(now - reference)` seconds to the day containing
    /// `reference`. Returns the posted amount, or `None` when nothing was
    /// posted (under one second, or the write failed).
    async fn flush_elapsed(&mut self, domain: &str, reference: DateTime<Local>) -> Option<u64> {
        let elapsed = (self.clock.now() - reference).num_seconds();
        // Clock skew can make this negative; treat it as an empty interval.
        if elapsed < 1 {
            return None;
        }
        let day = reference.date_naive();
        match self.ledger.post(domain, elapsed as u64, day).await {
            Ok(day_total) => {
                if day == self.clock.today() {
                    self.policy.day_total_updated(day, day_total, &self.settings).await;
                }
                Some(elapsed as u64)
            }
            Err(err) => {
                warn!("{}", Message::SessionFlushFailed(domain.to_string(), err.to_string()));
                None
            }
        }
    }

    /// Whole seconds accrued in the open session and not yet posted.
    fn unposted_seconds(&self) -> u64 {
        match &self.state {
            TrackState::Tracking { reference, .. } => (self.clock.now() - *reference).num_seconds().max(0) as u64,
            _ => 0,
        }
    }

    async fn probe_foreground_tab(&mut self) {
        match self.tabs.foreground_url().await {
            Ok(url) => self.apply_tab(url.as_deref()).await,
            Err(err) => warn!("{}", Message::ForegroundProbeFailed(err.to_string())),
        }
    }

    async fn prune_usage(&mut self) {
        match self.ledger.prune_older_than(self.settings.data_retention).await {
            Ok(_) => self.last_pruned = Some(self.clock.today()),
            Err(err) => warn!(error = %err, "usage pruning failed"),
        }
    }

    /// Reruns retention once per calendar day.
    async fn maybe_prune(&mut self) {
        if self.last_pruned != Some(self.clock.today()) {
            self.prune_usage().await;
        }
    }
}

/// Cloneable sending side of the monitor's event stream.
#[derive(Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<HostEvent>,
}

impl MonitorHandle {
    /// Creates a handle and the receiver to pass to [`Monitor::run`].
    pub fn channel() -> (Self, mpsc::Receiver<HostEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (MonitorHandle { tx }, rx)
    }

    pub async fn tab_changed(&self, url: Option<String>) -> Result<()> {
        self.send(HostEvent::TabChanged { url }).await
    }

    pub async fn window_focus(&self, focused: bool) -> Result<()> {
        self.send(HostEvent::WindowFocus { focused }).await
    }

    pub async fn settings_changed(&self, settings: Settings) -> Result<()> {
        self.send(HostEvent::SettingsChanged(settings)).await
    }

    /// Whole seconds accrued in the open session and not yet posted.
    pub async fn session_seconds(&self) -> Result<u64> {
        let (reply, answer) = oneshot::channel();
        self.send(HostEvent::Request(Request::SessionSeconds(reply))).await?;
        answer.await.context("monitor stopped before replying")
    }

    /// Snapshot of the current tracking state.
    pub async fn status(&self) -> Result<TrackingStatus> {
        let (reply, answer) = oneshot::channel();
        self.send(HostEvent::Request(Request::Status(reply))).await?;
        answer.await.context("monitor stopped before replying")
    }

    /// Snapshot of the current settings.
    pub async fn settings(&self) -> Result<Settings> {
        let (reply, answer) = oneshot::channel();
        self.send(HostEvent::Request(Request::Settings(reply))).await?;
        answer.await.context("monitor stopped before replying")
    }

    /// Wipes all usage data.
    pub async fn reset_all_data(&self) -> Result<()> {
        let (reply, answer) = oneshot::channel();
        self.send(HostEvent::Request(Request::ResetAllData(reply))).await?;
        answer.await.context("monitor stopped before replying")?
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(HostEvent::Shutdown).await
    }

    async fn send(&self, event: HostEvent) -> Result<()> {
        self.tx.send(event).await.context("monitor event channel closed")
    }
}

fn new_interval(period: Duration) -> Interval {
    let mut interval = interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Pends forever on an empty slot, so a disarmed clock never wins the
/// select.
async fn next_tick(slot: &mut Option<Interval>) {
    match slot {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
