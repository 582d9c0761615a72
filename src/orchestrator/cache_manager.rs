//! In-memory TTL cache with size-bounded eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

struct Entry {
    value: serde_json::Value,
    created_at: Instant,
    expires_at: Instant,
}

/// TTL cache keyed by string, bounded to `max_size` entries. When the bound
/// is exceeded on insert, the oldest 10% of entries (by creation time) are
/// evicted. Expired entries are removed lazily on access, not proactively.
pub struct CacheManager {
    entries: Mutex<HashMap<String, Entry>>,
    max_size: usize,
}

impl CacheManager {
    /// Creates a cache bounded to `max_size` entries.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_size,
        }
    }

    /// Returns the cached value for `key`, or `None` if absent or expired.
    /// An expired entry is removed as a side effect of this call.
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Inserts `value` under `key` with a TTL of `ttl_seconds`. Evicts the
    /// oldest 10% of entries first if this insert would exceed `max_size`.
    pub async fn set(&self, key: impl Into<String>, value: serde_json::Value, ttl_seconds: u64) {
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.max_size {
            let evict_count = (self.max_size / 10).max(1);
            tracing::debug!(evict_count, max_size = self.max_size, "cache at capacity, evicting oldest entries");
            let mut by_age: Vec<(String, Instant)> = entries.iter().map(|(k, v)| (k.clone(), v.created_at)).collect();
            by_age.sort_by_key(|(_, created_at)| *created_at);
            for (stale_key, _) in by_age.into_iter().take(evict_count) {
                entries.remove(&stale_key);
            }
        }
        let now = Instant::now();
        entries.insert(
            key.into(),
            Entry {
                value,
                created_at: now,
                expires_at: now + Duration::from_secs(ttl_seconds),
            },
        );
    }

    /// Removes `key`, if present.
    pub async fn delete(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Current entry count, including not-yet-lazily-expired entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = CacheManager::new(100);
        cache.set("key1", serde_json::json!({"v": 1}), 60).await;
        assert_eq!(cache.get("key1").await, Some(serde_json::json!({"v": 1})));
    }

    #[tokio::test]
    async fn expired_entry_is_removed_on_access() {
        let cache = CacheManager::new(100);
        cache.set("key1", serde_json::json!(1), 0).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.get("key1").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let cache = CacheManager::new(100);
        cache.set("key1", serde_json::json!(1), 60).await;
        cache.delete("key1").await;
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test]
    async fn clear_empties_cache() {
        let cache = CacheManager::new(100);
        cache.set("key1", serde_json::json!(1), 60).await;
        cache.set("key2", serde_json::json!(2), 60).await;
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn exceeding_max_size_evicts_oldest_ten_percent() {
        let cache = CacheManager::new(10);
        for i in 0..10 {
            cache.set(format!("key{i}"), serde_json::json!(i), 60).await;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(cache.len().await, 10);
        cache.set("key10", serde_json::json!(10), 60).await;
        assert_eq!(cache.len().await, 10);
        assert_eq!(cache.get("key0").await, None);
    }
}
