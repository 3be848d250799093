//! SQLite-backed store adapter.
//!
//! Persists the key-value surface as a single two-column table, one row per
//! key with the value serialized as JSON text. Each storage area gets its
//! own database file under the application data directory.

use super::kv::{KvStore, StoreError, StoreResult};
use crate::libs::data_storage::DataStorage;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Default database file for the usage area.
pub const USAGE_DB_FILE_NAME: &str = "usage.db";
/// Default database file for the settings area.
pub const SETTINGS_DB_FILE_NAME: &str = "settings.db";

const SCHEMA_ENTRIES: &str = "CREATE TABLE IF NOT EXISTS entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";
const UPSERT_ENTRY: &str = "INSERT INTO entries (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value";
const SELECT_ENTRY: &str = "SELECT value FROM entries WHERE key = ?1";
const SELECT_ALL: &str = "SELECT key, value FROM entries";
const DELETE_ENTRY: &str = "DELETE FROM entries WHERE key = ?1";
const DELETE_ALL: &str = "DELETE FROM entries";

/// A [`KvStore`] persisted in a SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens the usage-area database under the application data directory.
    pub fn usage() -> StoreResult<Self> {
        Self::in_data_dir(USAGE_DB_FILE_NAME)
    }

    /// Opens the settings-area database under the application data directory.
    pub fn settings() -> StoreResult<Self> {
        Self::in_data_dir(SETTINGS_DB_FILE_NAME)
    }

    fn in_data_dir(file_name: &str) -> StoreResult<Self> {
        let path = DataStorage::new()
            .get_path(file_name)
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        Self::open(&path)
    }

    /// Opens a database at an explicit path, creating the schema if needed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute(SCHEMA_ENTRIES, [])?;
        Ok(SqliteStore { conn: Mutex::new(conn) })
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, keys: &[&str]) -> StoreResult<HashMap<String, Value>> {
        let conn = self.conn.lock();
        let mut found = HashMap::new();
        for key in keys {
            let text: Option<String> = conn.query_row(SELECT_ENTRY, [key], |row| row.get(0)).optional()?;
            if let Some(text) = text {
                let value = serde_json::from_str(&text).map_err(|source| StoreError::Decode {
                    key: (*key).to_string(),
                    source,
                })?;
                found.insert((*key).to_string(), value);
            }
        }
        Ok(found)
    }

    async fn set(&self, entries: HashMap<String, Value>) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for (key, value) in &entries {
            let text = serde_json::to_string(value).map_err(|source| StoreError::Encode {
                key: key.clone(),
                source,
            })?;
            tx.execute(UPSERT_ENTRY, params![key, text])?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute(DELETE_ENTRY, [key])?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.conn.lock().execute(DELETE_ALL, [])?;
        Ok(())
    }

    async fn entries(&self) -> StoreResult<HashMap<String, Value>> {
        let conn = self.conn.lock();
        let mut statement = conn.prepare(SELECT_ALL)?;
        let rows = statement.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut found = HashMap::new();
        for row in rows {
            let (key, text) = row?;
            let value = serde_json::from_str(&text).map_err(|source| StoreError::Decode {
                key: key.clone(),
                source,
            })?;
            found.insert(key, value);
        }
        Ok(found)
    }
}
