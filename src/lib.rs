//! # Tabtime - Browser Usage Time Tracking Core
//!
//! The background engine of a per-domain browsing time tracker. It consumes
//! tab and window focus events from a host environment, accounts elapsed
//! time to the active domain second by second, and persists per-day usage
//! totals through a pluggable key-value store.
//!
//! ## Features
//!
//! - **Session Accounting**: One active session at a time, attributed to the
//!   domain of the foreground tab
//! - **Idle Detection**: Sessions pause automatically when no user activity
//!   is observed for a configurable threshold
//! - **Usage Ledger**: Day-keyed, domain-keyed usage totals with a flattened
//!   mirror of today's data for cheap reads
//! - **Notifications**: Daily goal and break reminders behind a host-provided
//!   notification sink
//! - **Forecasting**: A moving-average estimate of tomorrow's usage from
//!   recent daily totals
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabtime::libs::monitor::{Monitor, MonitorConfig, MonitorHandle};
//! use tabtime::store::memory::MemoryStore;
//!
//! # struct Tabs; struct Alerts;
//! # #[async_trait::async_trait]
//! # impl tabtime::libs::event::TabProvider for Tabs {
//! #     async fn foreground_url(&self) -> anyhow::Result<Option<String>> { Ok(None) }
//! # }
//! # #[async_trait::async_trait]
//! # impl tabtime::libs::notify::Notifier for Alerts {
//! #     async fn notify(&self, _: tabtime::libs::notify::Notification) -> anyhow::Result<()> { Ok(()) }
//! # }
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let usage = Arc::new(MemoryStore::new());
//!     let settings = Arc::new(MemoryStore::new());
//!     let mut monitor = Monitor::new(MonitorConfig::default(), usage, settings, Arc::new(Tabs), Arc::new(Alerts)).await;
//!     let (handle, events) = MonitorHandle::channel();
//!     tokio::spawn(async move { monitor.run(events).await });
//!     handle.tab_changed(Some("https://github.com/explore".to_string())).await?;
//!     Ok(())
//! }
//! ```

pub mod libs;
pub mod store;
