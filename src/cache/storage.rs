//! Cache Storage Module
//!
//! The cache store service the controller is injected with. Stores are
//! addressed by name; the controller only ever addresses the current one.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheStats, NamedCache};
use crate::error::{OfflineError, Result};
use crate::models::{FetchResponse, RequestKey};

// == Cache Storage Trait ==
/// Named key-value store of request→response pairs.
///
/// # Implementing a new backend
///
/// ```ignore
/// struct DiskStorage { /* ... */ }
///
/// #[async_trait]
/// impl CacheStorage for DiskStorage {
///     async fn open(&self, name: &str) -> Result<()> { /* ... */ }
///     // ...
/// }
/// ```
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens the cache `name`, creating it if absent.
    async fn open(&self, name: &str) -> Result<()>;

    /// Exact-match lookup. A cache that does not exist matches nothing.
    async fn match_exact(&self, name: &str, key: &RequestKey) -> Result<Option<FetchResponse>>;

    /// Stores one response, creating the cache if absent.
    async fn put(&self, name: &str, key: RequestKey, response: FetchResponse) -> Result<()>;

    /// Stores a batch of responses. Either every entry is written or none is.
    async fn add_all(&self, name: &str, entries: Vec<(RequestKey, FetchResponse)>) -> Result<()>;

    /// Lists the keys stored in `name`.
    async fn keys(&self, name: &str) -> Result<Vec<RequestKey>>;

    /// Lists every cache name, sorted.
    async fn cache_names(&self) -> Vec<String>;

    /// Deletes the cache `name`. Returns whether it existed.
    async fn delete(&self, name: &str) -> bool;

    /// Returns counters for `name`.
    async fn stats(&self, name: &str) -> Result<CacheStats>;
}

// == Memory Cache Storage ==
/// In-process cache storage with a byte quota shared by all named caches.
///
/// There is no eviction: writes past the quota are refused.
#[derive(Debug)]
pub struct MemoryCacheStorage {
    caches: RwLock<HashMap<String, NamedCache>>,
    /// Maximum total bytes across every named cache
    quota_bytes: usize,
}

impl MemoryCacheStorage {
    /// Creates an empty storage with the given byte quota.
    pub fn new(quota_bytes: usize) -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            quota_bytes,
        }
    }

    /// Creates an empty storage from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.cache_quota_bytes)
    }

    fn used_bytes(caches: &HashMap<String, NamedCache>) -> usize {
        caches.values().map(NamedCache::size_bytes).sum()
    }

    fn check_quota(&self, used: usize, growth: isize) -> Result<()> {
        let after = used as isize + growth;
        if after > self.quota_bytes as isize {
            return Err(OfflineError::QuotaExceeded(format!(
                "{} bytes requested, {} of {} bytes in use",
                growth, used, self.quota_bytes
            )));
        }
        Ok(())
    }
}

impl Default for MemoryCacheStorage {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default())
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let mut caches = self.caches.write().await;
        if !caches.contains_key(name) {
            debug!("Creating cache '{}'", name);
            caches.insert(name.to_string(), NamedCache::new());
        }
        Ok(())
    }

    async fn match_exact(&self, name: &str, key: &RequestKey) -> Result<Option<FetchResponse>> {
        let caches = self.caches.read().await;
        Ok(caches.get(name).and_then(|cache| cache.match_exact(key)))
    }

    async fn put(&self, name: &str, key: RequestKey, response: FetchResponse) -> Result<()> {
        NamedCache::validate_key(&key)?;

        let mut caches = self.caches.write().await;
        let used = Self::used_bytes(&caches);
        let growth = caches
            .get(name)
            .map(|cache| cache.growth(&key, &response))
            .unwrap_or(response.size_bytes() as isize);
        self.check_quota(used, growth)?;

        caches
            .entry(name.to_string())
            .or_default()
            .insert(key, response);
        Ok(())
    }

    async fn add_all(&self, name: &str, entries: Vec<(RequestKey, FetchResponse)>) -> Result<()> {
        for (key, _) in &entries {
            NamedCache::validate_key(key)?;
        }

        let mut caches = self.caches.write().await;
        let used = Self::used_bytes(&caches);

        // Growth of the whole batch, counting duplicate keys once (last wins)
        let mut batch: HashMap<&RequestKey, &FetchResponse> = HashMap::new();
        for (key, response) in &entries {
            batch.insert(key, response);
        }
        let growth: isize = match caches.get(name) {
            Some(cache) => batch.iter().map(|(k, r)| cache.growth(k, r)).sum(),
            None => batch.values().map(|r| r.size_bytes() as isize).sum(),
        };
        self.check_quota(used, growth)?;

        let cache = caches.entry(name.to_string()).or_default();
        for (key, response) in entries {
            cache.insert(key, response);
        }
        Ok(())
    }

    async fn keys(&self, name: &str) -> Result<Vec<RequestKey>> {
        let caches = self.caches.read().await;
        caches
            .get(name)
            .map(NamedCache::keys)
            .ok_or_else(|| OfflineError::CacheNotFound(name.to_string()))
    }

    async fn cache_names(&self) -> Vec<String> {
        let caches = self.caches.read().await;
        let mut names: Vec<String> = caches.keys().cloned().collect();
        names.sort();
        names
    }

    async fn delete(&self, name: &str) -> bool {
        self.caches.write().await.remove(name).is_some()
    }

    async fn stats(&self, name: &str) -> Result<CacheStats> {
        let caches = self.caches.read().await;
        caches
            .get(name)
            .map(NamedCache::stats)
            .ok_or_else(|| OfflineError::CacheNotFound(name.to_string()))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseType;
    use url::Url;

    const CACHE: &str = "finding-tafsir-v3";

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse("http://app.test/").unwrap().join(path).unwrap())
    }

    fn response(body: &str) -> FetchResponse {
        FetchResponse::new(200, body.to_string(), ResponseType::Basic, "http://app.test/")
    }

    #[tokio::test]
    async fn test_open_is_create_if_absent() {
        let storage = MemoryCacheStorage::new(1024);
        storage.open(CACHE).await.unwrap();
        storage.put(CACHE, key("/a"), response("a")).await.unwrap();

        // Reopening keeps existing entries
        storage.open(CACHE).await.unwrap();
        assert_eq!(storage.keys(CACHE).await.unwrap().len(), 1);
        assert_eq!(storage.cache_names().await, vec![CACHE.to_string()]);
    }

    #[tokio::test]
    async fn test_match_scoped_by_name() {
        let storage = MemoryCacheStorage::new(1024);
        storage.put("finding-tafsir-v2", key("/a"), response("old")).await.unwrap();

        assert!(storage.match_exact(CACHE, &key("/a")).await.unwrap().is_none());
        let old = storage.match_exact("finding-tafsir-v2", &key("/a")).await.unwrap();
        assert_eq!(old.unwrap().body.as_ref(), b"old");
    }

    #[tokio::test]
    async fn test_lookup_shares_read_lock() {
        let storage = MemoryCacheStorage::new(1024);
        storage.put(CACHE, key("/a"), response("a")).await.unwrap();

        // Another reader holding the map must not block lookups
        let guard = storage.caches.read().await;
        let lookup = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            storage.match_exact(CACHE, &key("/a")),
        )
        .await
        .expect("lookup blocked behind a reader");
        assert!(lookup.unwrap().is_some());
        storage.match_exact(CACHE, &key("/b")).await.unwrap();
        drop(guard);

        let stats = storage.stats(CACHE).await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_put_over_quota_rejected() {
        let storage = MemoryCacheStorage::new(10);
        storage.put(CACHE, key("/a"), response("12345678")).await.unwrap();

        let result = storage.put(CACHE, key("/b"), response("123")).await;
        assert!(matches!(result, Err(OfflineError::QuotaExceeded(_))));
        assert!(storage.match_exact(CACHE, &key("/b")).await.unwrap().is_none());

        // Replacing an entry only counts the difference
        storage.put(CACHE, key("/a"), response("1234567890")).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_all_is_atomic() {
        let storage = MemoryCacheStorage::new(8);
        let entries = vec![
            (key("/a"), response("1234")),
            (key("/b"), response("12345")),
        ];

        let result = storage.add_all(CACHE, entries).await;
        assert!(matches!(result, Err(OfflineError::QuotaExceeded(_))));
        assert!(storage.keys(CACHE).await.is_err());
    }

    #[tokio::test]
    async fn test_add_all_duplicate_keys_stored_once() {
        let storage = MemoryCacheStorage::new(1024);
        let entries = vec![(key("/a"), response("first")), (key("/a"), response("second"))];
        storage.add_all(CACHE, entries).await.unwrap();

        assert_eq!(storage.keys(CACHE).await.unwrap(), vec![key("/a")]);
        let stored = storage.match_exact(CACHE, &key("/a")).await.unwrap().unwrap();
        assert_eq!(stored.body.as_ref(), b"second");
    }

    #[tokio::test]
    async fn test_delete_and_missing_cache() {
        let storage = MemoryCacheStorage::new(1024);
        storage.open(CACHE).await.unwrap();

        assert!(storage.delete(CACHE).await);
        assert!(!storage.delete(CACHE).await);
        assert!(matches!(
            storage.stats(CACHE).await,
            Err(OfflineError::CacheNotFound(_))
        ));
    }
}
