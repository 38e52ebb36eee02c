use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Key/value backend behind the page cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
    async fn expire(&self, key: &str);
}

/// In-process store with a deadline per entry. Expired entries are swept
/// on write, at most once per TTL.
pub struct MemoryStore {
    entries: DashMap<String, (String, Instant)>,
    next_sweep: Mutex<Instant>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            next_sweep: Mutex::new(Instant::now()),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sweep_if_due(&self, now: Instant, ttl: Duration) {
        let Ok(mut next_sweep) = self.next_sweep.lock() else {
            return;
        };
        if now < *next_sweep {
            return;
        }
        *next_sweep = now + ttl;
        drop(next_sweep);

        let before = self.entries.len();
        self.entries.retain(|_, (_, deadline)| *deadline > now);
        let swept = before.saturating_sub(self.entries.len());
        if swept > 0 {
            tracing::debug!("Swept {} expired page cache entries", swept);
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(entry) if entry.1 > Instant::now() => return Some(entry.0.clone()),
            Some(_) => {}
            None => return None,
        }
        self.entries
            .remove_if(key, |_, (_, deadline)| *deadline <= Instant::now());
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let now = Instant::now();
        self.sweep_if_due(now, ttl);
        self.entries.insert(key.to_string(), (value, now + ttl));
    }

    async fn expire(&self, key: &str) {
        self.entries.remove(key);
    }
}

pub struct RedisStore {
    redis: ConnectionManager,
}

impl RedisStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.redis.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Redis GET {} failed: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut conn = self.redis.clone();
        let ttl_secs = ttl.as_secs().max(1);
        if let Err(e) = conn.set_ex::<_, _, ()>(key, value, ttl_secs).await {
            tracing::warn!("Redis SETEX {} failed: {}", key, e);
        }
    }

    async fn expire(&self, key: &str) {
        let mut conn = self.redis.clone();
        if let Err(e) = conn.del::<_, ()>(key).await {
            tracing::warn!("Redis DEL {} failed: {}", key, e);
        }
    }
}

/// Rendered-view cache shared by the handlers that opt into it.
#[derive(Clone)]
pub struct PageCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new()), ttl)
    }

    /// Key for a view: its name plus the arguments that select the content.
    pub fn view_key(view: &str, args: &[&str]) -> String {
        let mut key = format!("views:{}", view);
        for arg in args {
            key.push(':');
            key.push_str(arg);
        }
        key
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key).await?;
        serde_json::from_str(&raw).ok()
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        if self.ttl.is_zero() {
            return;
        }
        match serde_json::to_string(value) {
            Ok(json) => self.store.set(key, json, self.ttl).await,
            Err(e) => tracing::warn!("Failed to serialize cache entry {}: {}", key, e),
        }
    }

    pub async fn expire(&self, key: &str) {
        self.store.expire(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip_and_expire() {
        let cache = PageCache::in_memory(Duration::from_secs(60));
        cache.set("k", &vec![1, 2, 3]).await;
        assert_eq!(cache.get::<Vec<i32>>("k").await, Some(vec![1, 2, 3]));
        cache.expire("k").await;
        assert_eq!(cache.get::<Vec<i32>>("k").await, None);
    }

    #[tokio::test]
    async fn memory_store_entries_lapse_after_ttl() {
        let store = MemoryStore::new();
        store
            .set("k", "v".to_string(), Duration::from_millis(10))
            .await;
        assert_eq!(store.get("k").await.as_deref(), Some("v"));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get("k").await, None);
        assert!(store.entries.is_empty());
    }

    #[tokio::test]
    async fn writes_reclaim_expired_entries() {
        let store = MemoryStore::new();
        for page in 0..1000 {
            store
                .set(&format!("views:index:{}", page), "stale".to_string(), Duration::from_millis(1))
                .await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        store
            .set("views:index:1", "fresh".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(store.entries.len(), 1);
        assert_eq!(store.get("views:index:1").await.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let cache = PageCache::in_memory(Duration::ZERO);
        cache.set("k", &"v").await;
        assert_eq!(cache.get::<String>("k").await, None);
    }

    #[test]
    fn view_key_includes_arguments() {
        assert_eq!(PageCache::view_key("index", &["2"]), "views:index:2");
        assert_eq!(PageCache::view_key("index", &[]), "views:index");
    }
}
