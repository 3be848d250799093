//! Per-day, per-domain usage ledger over the key-value store.
//!
//! All usage history lives under a single `usage` key in the local storage
//! area as a nested map of day key to domain to whole seconds. Next to it
//! the ledger maintains a flattened mirror of today's slice: one root-level
//! key per domain used today, holding that domain's seconds. Presentation
//! surfaces read the mirror directly and never have to decode the nested
//! map.
//!
//! The mirror is derived data. After every posting it equals today's slice
//! of the usage map; on the first posting after a day change (or after a
//! restart) it is rebuilt from scratch, which also heals a mirror left
//! stale by a crash.
//!
//! Every posting commits the usage map and the mirror in one batched store
//! write. The [`KvStore`] contract makes that write all-or-nothing, so a
//! posting that returns an error has recorded nothing and the same seconds
//! can be posted again without double counting.

use crate::libs::clock::Clock;
use crate::libs::messages::Message;
use crate::store::kv::KvStore;
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Storage key of the nested usage map in the local area.
pub const USAGE_KEY: &str = "usage";

/// Day keys follow the ISO calendar date, which sorts chronologically.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Nested usage data: day key to domain to whole seconds.
pub type UsageMap = BTreeMap<String, BTreeMap<String, u64>>;

/// One day's usage total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub seconds: u64,
}

/// Day-keyed usage accounting with a flattened mirror of today.
pub struct UsageLedger {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    /// Day the mirror currently reflects. `None` forces a rebuild on the
    /// next posting.
    mirror_day: Option<NaiveDate>,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock, mirror_day: None }
    }

    /// Adds whole seconds to a domain's total for the given day.
    ///
    /// Returns the day's total across all domains after the update, which
    /// feeds the daily goal check. The usage map and the mirror ride a
    /// single store write: an error commits nothing, and the caller may
    /// post the same interval again.
    pub async fn post(&mut self, domain: &str, seconds: u64, day: NaiveDate) -> Result<u64> {
        let mut usage = self.read_usage().await?;
        let day_slice = usage.entry(day_key(day)).or_default();
        let domain_total = day_slice.entry(domain.to_string()).or_insert(0);
        *domain_total += seconds;
        let domain_total = *domain_total;
        let day_total: u64 = day_slice.values().sum();

        let today = self.clock.today();
        if self.mirror_day == Some(today) {
            let mut entries = HashMap::new();
            entries.insert(USAGE_KEY.to_string(), encode_usage(&usage)?);
            // A posting to an earlier day does not change today's slice.
            if day == today {
                entries.insert(domain.to_string(), Value::from(domain_total));
            }
            self.store.set(entries).await.context("write usage map")?;
        } else {
            self.rebuild_mirror(&usage, today).await?;
        }
        debug!(domain, seconds, day = %day, domain_total, "usage posted");
        Ok(day_total)
    }

    /// Today's per-domain totals.
    pub async fn today_totals(&self) -> Result<BTreeMap<String, u64>> {
        let usage = self.read_usage().await?;
        Ok(usage.get(&day_key(self.clock.today())).cloned().unwrap_or_default())
    }

    /// Total seconds across all domains for one day.
    pub async fn day_total(&self, day: NaiveDate) -> Result<u64> {
        let usage = self.read_usage().await?;
        Ok(usage.get(&day_key(day)).map(|slice| slice.values().sum()).unwrap_or(0))
    }

    /// Per-day totals across all domains, oldest first. Days without usage
    /// are absent.
    pub async fn daily_totals(&self) -> Result<Vec<DayTotal>> {
        let usage = self.read_usage().await?;
        let mut totals = Vec::with_capacity(usage.len());
        for (key, slice) in &usage {
            if let Some(date) = parse_day_key(key) {
                totals.push(DayTotal {
                    date,
                    seconds: slice.values().sum(),
                });
            }
        }
        Ok(totals)
    }

    /// One domain's daily seconds over the trailing `days` days ending
    /// today, zero-filled for days without usage.
    pub async fn domain_history(&self, domain: &str, days: u32) -> Result<Vec<DayTotal>> {
        let usage = self.read_usage().await?;
        let today = self.clock.today();
        let mut history = Vec::with_capacity(days as usize);
        for back in (0..i64::from(days)).rev() {
            let date = today - Duration::days(back);
            let seconds = usage
                .get(&day_key(date))
                .and_then(|slice| slice.get(domain))
                .copied()
                .unwrap_or(0);
            history.push(DayTotal { date, seconds });
        }
        Ok(history)
    }

    /// Every domain appearing anywhere in the usage history, sorted.
    pub async fn domains(&self) -> Result<Vec<String>> {
        let usage = self.read_usage().await?;
        let mut domains: Vec<String> = usage.values().flat_map(|slice| slice.keys().cloned()).collect();
        domains.sort();
        domains.dedup();
        Ok(domains)
    }

    /// Drops days older than the retention window. The day exactly at
    /// `today - retention_days` is kept. Returns the number of days removed.
    pub async fn prune_older_than(&mut self, retention_days: u32) -> Result<usize> {
        let cutoff = self.clock.today() - Duration::days(i64::from(retention_days));
        let mut usage = self.read_usage().await?;
        let before = usage.len();
        usage.retain(|key, _| matches!(parse_day_key(key), Some(date) if date >= cutoff));
        let removed = before - usage.len();
        if removed > 0 {
            self.write_usage(&usage).await?;
            info!("{}", Message::UsagePruned(removed, day_key(cutoff)));
        }
        Ok(removed)
    }

    /// Wipes the entire usage area, mirror included.
    pub async fn reset(&mut self) -> Result<()> {
        self.store.clear().await.context("clear usage store")?;
        self.mirror_day = None;
        info!("{}", Message::UsageReset);
        Ok(())
    }

    async fn read_usage(&self) -> Result<UsageMap> {
        let mut found = self.store.get(&[USAGE_KEY]).await.context("read usage map")?;
        match found.remove(USAGE_KEY) {
            Some(value) => serde_json::from_value(value).context("decode usage map"),
            None => Ok(UsageMap::new()),
        }
    }

    async fn write_usage(&self, usage: &UsageMap) -> Result<()> {
        let mut entries = HashMap::new();
        entries.insert(USAGE_KEY.to_string(), encode_usage(usage)?);
        self.store.set(entries).await.context("write usage map")?;
        Ok(())
    }

    /// Drops every root-level key except the usage map, then writes the
    /// updated map and today's slice in one call. The map rides the same
    /// write as the mirror keys: a failure anywhere leaves the posting
    /// uncommitted, and `mirror_day` advances only after the write landed,
    /// so a failed rebuild is retried on the next posting.
    async fn rebuild_mirror(&mut self, usage: &UsageMap, today: NaiveDate) -> Result<()> {
        let existing = self.store.entries().await.context("enumerate store for mirror rebuild")?;
        let stale: Vec<String> = existing.into_keys().filter(|key| key != USAGE_KEY).collect();
        if !stale.is_empty() {
            let stale_refs: Vec<&str> = stale.iter().map(String::as_str).collect();
            self.store.remove(&stale_refs).await.context("drop stale mirror keys")?;
        }
        let mut entries: HashMap<String, Value> = usage
            .get(&day_key(today))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|(domain, seconds)| (domain, Value::from(seconds)))
            .collect();
        entries.insert(USAGE_KEY.to_string(), encode_usage(usage)?);
        self.store.set(entries).await.context("write usage map and today mirror")?;
        self.mirror_day = Some(today);
        info!("{}", Message::MirrorRebuilt(day_key(today)));
        Ok(())
    }
}

pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

fn encode_usage(usage: &UsageMap) -> Result<Value> {
    serde_json::to_value(usage).context("encode usage map")
}

fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DAY_KEY_FORMAT).ok()
}
