//! User settings for the tracking core.
//!
//! Settings live as a single JSON snapshot under one key in the sync
//! storage area, so hosts that replicate that area get roaming settings for
//! free. Reads always merge the stored snapshot over the built-in defaults:
//! fields missing from storage keep their defaults and unknown stored
//! fields are ignored, which keeps snapshots written by older or newer
//! versions readable in both directions.
//!
//! ## Failure posture
//!
//! A failed or corrupted read logs a warning and falls back to the
//! defaults. Tracking never stalls on settings; the monitor keeps its last
//! known snapshot until a better one arrives.

use crate::libs::messages::Message;
use crate::store::kv::KvStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// Storage key for the settings snapshot in the sync area.
pub const SETTINGS_KEY: &str = "settings";

/// The full user settings snapshot.
///
/// Serialized with camelCase field names, matching the stored layout the
/// presentation surfaces read directly.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Master switch for all time tracking.
    pub tracking_enabled: bool,

    /// Resume tracking automatically when the host starts.
    pub auto_start: bool,

    /// Minutes without user activity before the open session pauses.
    /// Zero disables idle detection.
    pub idle_threshold: u64,

    /// Master switch for all notifications.
    pub notifications: bool,

    /// Play a sound with notifications (honored by the host sink).
    pub sound_alerts: bool,

    /// Dark mode for the presentation surfaces.
    pub dark_mode: bool,

    /// Days of usage history to keep; older days are pruned.
    pub data_retention: u32,

    /// Sites excluded from tracking, matched loosely against domains.
    pub excluded_sites: Vec<String>,

    /// Daily usage goal in hours.
    pub daily_goal: f64,

    /// Whether periodic break reminders fire.
    pub break_reminder: bool,

    /// Minutes of tracking-enabled time between break reminders.
    pub break_interval: u64,

    /// Collect domains only, without full URLs (honored by the host).
    pub privacy_mode: bool,

    /// Replicate settings through the host's sync mechanism.
    pub sync_data: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tracking_enabled: true,
            auto_start: true,
            idle_threshold: 5,
            notifications: true,
            sound_alerts: false,
            dark_mode: false,
            data_retention: 30,
            excluded_sites: Vec::new(),
            daily_goal: 8.0,
            break_reminder: true,
            break_interval: 60,
            privacy_mode: false,
            sync_data: true,
        }
    }
}

impl Settings {
    /// Loads settings from the sync area, merging stored values over defaults.
    ///
    /// Never fails: storage and decode errors are logged and the defaults
    /// returned instead.
    pub async fn load(store: &dyn KvStore) -> Self {
        let stored = match store.get(&[SETTINGS_KEY]).await {
            Ok(mut found) => found.remove(SETTINGS_KEY),
            Err(err) => {
                warn!("{}", Message::SettingsLoadFailed(err.to_string()));
                return Self::default();
            }
        };
        match stored {
            Some(value) => match serde_json::from_value(value) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!("{}", Message::SettingsDecodeFailed(err.to_string()));
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Persists the full settings snapshot to the sync area.
    pub async fn save(&self, store: &dyn KvStore) -> Result<()> {
        let value = serde_json::to_value(self).context("serialize settings")?;
        let mut entries = HashMap::new();
        entries.insert(SETTINGS_KEY.to_string(), value);
        store.set(entries).await.context("write settings")?;
        info!("{}", Message::SettingsSaved);
        Ok(())
    }

    /// Loads, applies a mutation and persists the result in one step.
    pub async fn update(store: &dyn KvStore, apply: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let mut settings = Self::load(store).await;
        apply(&mut settings);
        settings.save(store).await?;
        Ok(settings)
    }

    /// Adds a site to the exclusion list if not already present.
    pub async fn add_excluded_site(store: &dyn KvStore, site: &str) -> Result<Settings> {
        let site = site.trim().to_string();
        Self::update(store, |settings| {
            if !site.is_empty() && !settings.excluded_sites.contains(&site) {
                settings.excluded_sites.push(site);
            }
        })
        .await
    }

    /// Removes a site from the exclusion list.
    pub async fn remove_excluded_site(store: &dyn KvStore, site: &str) -> Result<Settings> {
        Self::update(store, |settings| settings.excluded_sites.retain(|entry| entry != site)).await
    }

    /// Restores the built-in defaults and persists them.
    pub async fn reset_to_defaults(store: &dyn KvStore) -> Result<Settings> {
        let defaults = Self::default();
        defaults.save(store).await?;
        Ok(defaults)
    }

    /// Checks whether a domain is excluded from tracking.
    ///
    /// Matching is symmetric and substring-based: the entry `reddit.com`
    /// excludes `www.reddit.com`, and the entry `www.reddit.com` also
    /// excludes `reddit.com`. Empty entries never match.
    pub fn is_excluded(&self, domain: &str) -> bool {
        self.excluded_sites
            .iter()
            .map(|entry| entry.trim())
            .filter(|entry| !entry.is_empty())
            .any(|entry| domain.contains(entry) || entry.contains(domain))
    }
}
