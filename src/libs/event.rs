//! Host events and the inbound event surface.
//!
//! The host environment observes the browser (tab activations, navigations,
//! window focus, settings writes) and forwards everything as [`HostEvent`]
//! values over one channel, in the order it happened. Read and control
//! requests travel the same channel as [`Request`] values carrying a reply
//! sender, so they are answered between transitions and never observe a
//! half-applied state.

use crate::libs::monitor::TrackingStatus;
use crate::libs::settings::Settings;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::oneshot;
use url::Url;

/// Events pushed by the host environment into the monitor.
#[derive(Debug)]
pub enum HostEvent {
    /// The foreground tab changed or finished a navigation.
    TabChanged { url: Option<String> },
    /// The browser window gained or lost OS focus.
    WindowFocus { focused: bool },
    /// The settings area changed; carries the new snapshot.
    SettingsChanged(Settings),
    /// A read or control request expecting a reply.
    Request(Request),
    /// Stop the monitor loop.
    Shutdown,
}

/// Requests answered over a oneshot channel.
#[derive(Debug)]
pub enum Request {
    /// Whole seconds accrued in the open session and not yet posted.
    SessionSeconds(oneshot::Sender<u64>),
    /// Snapshot of the current tracking state.
    Status(oneshot::Sender<TrackingStatus>),
    /// Snapshot of the current settings.
    Settings(oneshot::Sender<Settings>),
    /// Wipe all usage data and reset in-flight accounting.
    ResetAllData(oneshot::Sender<Result<()>>),
}

/// Read access to the host's current foreground tab.
///
/// Consulted once at startup and when tracking is re-enabled, so neither a
/// restart nor a settings change has to wait for the next tab event.
#[async_trait]
pub trait TabProvider: Send + Sync {
    /// URL of the active tab in the focused window, if any.
    async fn foreground_url(&self) -> Result<Option<String>>;
}

/// Extracts the tracked domain from a raw tab URL.
///
/// Only `http` and `https` URLs resolve. Internal browser pages, extension
/// pages, file URLs and unparsable strings all yield `None`.
pub fn resolve_domain(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str().map(|host| host.to_string())
}
