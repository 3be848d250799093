//! In-memory store adapter for tests and volatile hosts.

use super::kv::{KvStore, StoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// A [`KvStore`] holding everything in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> StoreResult<HashMap<String, Value>> {
        let entries = self.entries.lock();
        let found = keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|value| ((*key).to_string(), value.clone())))
            .collect();
        Ok(found)
    }

    async fn set(&self, new_entries: HashMap<String, Value>) -> StoreResult<()> {
        self.entries.lock().extend(new_entries);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> StoreResult<()> {
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.lock().clear();
        Ok(())
    }

    async fn entries(&self) -> StoreResult<HashMap<String, Value>> {
        Ok(self.entries.lock().clone())
    }
}
