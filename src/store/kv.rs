//! Pluggable key-value storage contract.
//!
//! The tracking core persists everything through this narrow, asynchronous
//! key-value surface: string keys mapped to JSON values, with batched reads
//! and writes. It mirrors the storage API browser extensions get from their
//! host, so the core runs unchanged against an extension storage area, a
//! SQLite file or an in-memory map.
//!
//! Two independent areas are in play at runtime: a local area holding usage
//! data and a sync area holding settings. Each is just a separate `KvStore`
//! handle; the contract itself knows nothing about areas.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors surfaced by key-value store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium failed (I/O, database, host bridge).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A value could not be serialized for storage.
    #[error("failed to encode value for key '{key}': {source}")]
    Encode { key: String, source: serde_json::Error },

    /// A stored value could not be parsed back into JSON.
    #[error("failed to decode value for key '{key}': {source}")]
    Decode { key: String, source: serde_json::Error },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Store result type.
pub type StoreResult<T> = Result<T, StoreError>;

/// Asynchronous key-value store with JSON values.
///
/// Implementations must apply each call atomically with respect to other
/// calls on the same handle: a batched `set` either lands entirely or not
/// at all.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetches the values for `keys`. Missing keys are absent from the result.
    async fn get(&self, keys: &[&str]) -> StoreResult<HashMap<String, Value>>;

    /// Writes all `entries`, overwriting existing values.
    async fn set(&self, entries: HashMap<String, Value>) -> StoreResult<()>;

    /// Deletes `keys`. Keys that do not exist are ignored.
    async fn remove(&self, keys: &[&str]) -> StoreResult<()>;

    /// Deletes every key in the store.
    async fn clear(&self) -> StoreResult<()>;

    /// Returns the entire store contents.
    async fn entries(&self) -> StoreResult<HashMap<String, Value>>;
}
