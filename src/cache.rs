//! Key-value cache with per-entry TTL, plus typed JSON helpers that log
//! failures instead of propagating them.

use crate::errors::CacheError;
use async_trait::async_trait;
use moka::Expiry;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::warn;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` only when `key` is absent. Returns whether it was stored.
    async fn add(&self, key: &str, value: String, ttl: Duration) -> Result<bool, CacheError>;

    /// Overwrites `value` only when `key` is present. Returns whether it was stored.
    async fn replace(&self, key: &str, value: String, ttl: Duration) -> Result<bool, CacheError>;

    /// Returns whether an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Clone)]
pub struct MokaCache {
    inner: moka::future::Cache<String, CacheEntry>,
}

impl MokaCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: moka::future::Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryTtl)
                .build(),
        }
    }
}

#[async_trait]
impl Cache for MokaCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.inner.get(key).await.map(|entry| entry.value))
    }

    async fn add(&self, key: &str, value: String, ttl: Duration) -> Result<bool, CacheError> {
        let entry = self
            .inner
            .entry(key.to_string())
            .or_insert(CacheEntry { value, ttl })
            .await;
        Ok(entry.is_fresh())
    }

    async fn replace(&self, key: &str, value: String, ttl: Duration) -> Result<bool, CacheError> {
        if !self.inner.contains_key(key) {
            return Ok(false);
        }
        self.inner
            .insert(key.to_string(), CacheEntry { value, ttl })
            .await;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.inner.remove(key).await.is_some())
    }
}

/// Reads and decodes `key`. Misses, backend errors and stale encodings all
/// come back as `None`.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("discarding undecodable cache entry {key}: {err}");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!("cache read for {key} failed: {err}");
            None
        }
    }
}

pub async fn add_json<T: Serialize>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<bool, CacheError> {
    let raw = encode(key, value)?;
    cache.add(key, raw, ttl).await
}

pub async fn replace_json<T: Serialize>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<bool, CacheError> {
    let raw = encode(key, value)?;
    cache.replace(key, raw, ttl).await
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<String, CacheError> {
    serde_json::to_string(value).map_err(|source| CacheError::Encoding {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn add_only_stores_when_absent() {
        let cache = MokaCache::new(16);
        assert!(cache.add("k", "1".into(), TTL).await.unwrap());
        assert!(!cache.add("k", "2".into(), TTL).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn replace_only_stores_when_present() {
        let cache = MokaCache::new(16);
        assert!(!cache.replace("k", "1".into(), TTL).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);

        cache.add("k", "1".into(), TTL).await.unwrap();
        assert!(cache.replace("k", "2".into(), TTL).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let cache = MokaCache::new(16);
        assert!(!cache.delete("k").await.unwrap());
        cache.add("k", "1".into(), TTL).await.unwrap();
        assert!(cache.delete("k").await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let cache = MokaCache::new(16);
        cache
            .add("short", "1".into(), Duration::from_millis(50))
            .await
            .unwrap();
        cache.add("long", "2".into(), TTL).await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn json_helpers_round_trip_and_drop_garbage() {
        let cache = MokaCache::new(16);
        add_json(&cache, "names", &vec!["water".to_string()], TTL)
            .await
            .unwrap();
        let names: Option<Vec<String>> = get_json(&cache, "names").await;
        assert_eq!(names, Some(vec!["water".to_string()]));

        cache.add("bad", "{not json".into(), TTL).await.unwrap();
        let bad: Option<Vec<String>> = get_json(&cache, "bad").await;
        assert!(bad.is_none());
    }
}
