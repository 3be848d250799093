//! Core library modules for the tabtime background engine.
//!
//! Serves as the main entry point for all tabtime library components,
//! providing a centralized access point to the engine's core functionality.
//!
//! ## Features
//!
//! - **Activity Monitoring**: Session state machine, idle detection, timers
//! - **Usage Accounting**: Per-day, per-domain ledger with a today mirror
//! - **Notifications**: Daily goal and break reminder policy
//! - **Forecasting**: Moving-average usage prediction
//! - **Core Infrastructure**: Settings, clock abstraction, messaging, logging
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tabtime::libs::settings::Settings;
//! use tabtime::store::memory::MemoryStore;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let store = MemoryStore::new();
//! let settings = Settings::load(&store).await;
//! assert!(settings.tracking_enabled);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod data_storage;
pub mod event;
pub mod forecast;
pub mod formatter;
pub mod idle;
pub mod ledger;
pub mod logging;
pub mod messages;
pub mod monitor;
pub mod notify;
pub mod settings;
