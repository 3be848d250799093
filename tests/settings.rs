#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tabtime::libs::settings::{Settings, SETTINGS_KEY};
    use tabtime::store::kv::{KvStore, StoreError, StoreResult};
    use tabtime::store::memory::MemoryStore;

    /// A store whose every call fails, for exercising the fallback path.
    struct BrokenStore;

    #[async_trait]
    impl KvStore for BrokenStore {
        async fn get(&self, _keys: &[&str]) -> StoreResult<HashMap<String, Value>> {
            Err(StoreError::Backend("store offline".to_string()))
        }

        async fn set(&self, _entries: HashMap<String, Value>) -> StoreResult<()> {
            Err(StoreError::Backend("store offline".to_string()))
        }

        async fn remove(&self, _keys: &[&str]) -> StoreResult<()> {
            Err(StoreError::Backend("store offline".to_string()))
        }

        async fn clear(&self) -> StoreResult<()> {
            Err(StoreError::Backend("store offline".to_string()))
        }

        async fn entries(&self) -> StoreResult<HashMap<String, Value>> {
            Err(StoreError::Backend("store offline".to_string()))
        }
    }

    async fn seed(store: &MemoryStore, snapshot: Value) {
        let mut entries = HashMap::new();
        entries.insert(SETTINGS_KEY.to_string(), snapshot);
        store.set(entries).await.unwrap();
    }

    #[test]
    fn test_defaults_match_shipped_values() {
        let settings = Settings::default();
        assert!(settings.tracking_enabled);
        assert!(settings.auto_start);
        assert_eq!(settings.idle_threshold, 5);
        assert!(settings.notifications);
        assert!(!settings.sound_alerts);
        assert!(!settings.dark_mode);
        assert_eq!(settings.data_retention, 30);
        assert!(settings.excluded_sites.is_empty());
        assert_eq!(settings.daily_goal, 8.0);
        assert!(settings.break_reminder);
        assert_eq!(settings.break_interval, 60);
        assert!(!settings.privacy_mode);
        assert!(settings.sync_data);
    }

    #[tokio::test]
    async fn test_load_from_empty_store_returns_defaults() {
        let store = MemoryStore::new();
        let settings = Settings::load(&store).await;
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_partial_snapshot_merges_over_defaults() {
        let store = MemoryStore::new();
        seed(&store, json!({"trackingEnabled": false, "dailyGoal": 2.5})).await;

        let settings = Settings::load(&store).await;
        assert!(!settings.tracking_enabled);
        assert_eq!(settings.daily_goal, 2.5);
        // Everything the snapshot omitted keeps its default.
        assert_eq!(settings.idle_threshold, 5);
        assert_eq!(settings.data_retention, 30);
        assert!(settings.break_reminder);
    }

    #[tokio::test]
    async fn test_unknown_snapshot_fields_are_ignored() {
        let store = MemoryStore::new();
        seed(&store, json!({"idleThreshold": 10, "fieldFromTheFuture": [1, 2, 3]})).await;

        let settings = Settings::load(&store).await;
        assert_eq!(settings.idle_threshold, 10);
    }

    #[tokio::test]
    async fn test_corrupted_snapshot_falls_back_to_defaults() {
        let store = MemoryStore::new();
        seed(&store, json!("not an object")).await;

        let settings = Settings::load(&store).await;
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_store_failure_falls_back_to_defaults() {
        let settings = Settings::load(&BrokenStore).await;
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_save_writes_camel_case_keys() {
        let store = MemoryStore::new();
        Settings::default().save(&store).await.unwrap();

        let mut found = store.get(&[SETTINGS_KEY]).await.unwrap();
        let snapshot = found.remove(SETTINGS_KEY).unwrap();
        let object = snapshot.as_object().unwrap();
        assert!(object.contains_key("trackingEnabled"));
        assert!(object.contains_key("idleThreshold"));
        assert!(object.contains_key("excludedSites"));
        assert!(object.contains_key("dataRetention"));
        assert!(object.contains_key("breakReminder"));
        assert!(!object.contains_key("tracking_enabled"));
    }

    #[tokio::test]
    async fn test_update_round_trips_through_the_store() {
        let store = MemoryStore::new();

        let updated = Settings::update(&store, |settings| settings.idle_threshold = 15).await.unwrap();
        assert_eq!(updated.idle_threshold, 15);

        let reloaded = Settings::load(&store).await;
        assert_eq!(reloaded.idle_threshold, 15);
    }

    #[tokio::test]
    async fn test_add_excluded_site_dedups_and_trims() {
        let store = MemoryStore::new();

        let settings = Settings::add_excluded_site(&store, " reddit.com ").await.unwrap();
        assert_eq!(settings.excluded_sites, vec!["reddit.com"]);

        let settings = Settings::add_excluded_site(&store, "reddit.com").await.unwrap();
        assert_eq!(settings.excluded_sites, vec!["reddit.com"], "adding a duplicate should not grow the list");

        let settings = Settings::add_excluded_site(&store, "   ").await.unwrap();
        assert_eq!(settings.excluded_sites, vec!["reddit.com"], "whitespace-only entries should be rejected");
    }

    #[tokio::test]
    async fn test_remove_excluded_site() {
        let store = MemoryStore::new();
        Settings::add_excluded_site(&store, "reddit.com").await.unwrap();
        Settings::add_excluded_site(&store, "news.ycombinator.com").await.unwrap();

        let settings = Settings::remove_excluded_site(&store, "reddit.com").await.unwrap();
        assert_eq!(settings.excluded_sites, vec!["news.ycombinator.com"]);
    }

    #[tokio::test]
    async fn test_reset_to_defaults_persists() {
        let store = MemoryStore::new();
        Settings::update(&store, |settings| {
            settings.tracking_enabled = false;
            settings.daily_goal = 1.0;
        })
        .await
        .unwrap();

        Settings::reset_to_defaults(&store).await.unwrap();
        assert_eq!(Settings::load(&store).await, Settings::default());
    }

    #[test]
    fn test_is_excluded_matches_symmetrically() {
        let mut settings = Settings::default();
        settings.excluded_sites = vec!["reddit.com".to_string()];

        assert!(settings.is_excluded("reddit.com"));
        assert!(settings.is_excluded("www.reddit.com"), "a bare entry should match the subdomain");

        settings.excluded_sites = vec!["www.reddit.com".to_string()];
        assert!(settings.is_excluded("reddit.com"), "a subdomain entry should match the bare domain");
        assert!(!settings.is_excluded("github.com"));
    }

    #[test]
    fn test_blank_exclusion_entries_never_match() {
        let mut settings = Settings::default();
        settings.excluded_sites = vec!["".to_string(), "   ".to_string()];

        assert!(!settings.is_excluded("github.com"));
        assert!(!settings.is_excluded(""));
    }
}
