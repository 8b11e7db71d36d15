use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::KeyFetchError;
use crate::key_set::KeySet;
use crate::key_set::KeySetFetcher;

struct CachedKeySet {
    key_set: Arc<KeySet>,
    fetched_at: Instant,
}

impl CachedKeySet {
    fn new(key_set: KeySet) -> Self {
        Self {
            key_set: Arc::new(key_set),
            fetched_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() >= ttl
    }

    fn is_younger_than(&self, age: Duration) -> bool {
        self.fetched_at.elapsed() < age
    }
}

/// Provider name and key set URL; two providers only share an entry if both match
type CacheKey = (String, String);

fn cache_key(fetcher: &KeySetFetcher) -> CacheKey {
    (fetcher.provider().to_string(), fetcher.url().to_string())
}

/// Cache for provider key sets with expiration and single-flight refresh
///
/// Entries are keyed by provider name and key set URL, so providers with
/// different trust anchors never see each other's keys. Concurrent callers
/// that miss the cache for the same entry wait on one refresh instead of each
/// fetching.
pub struct KeySetCache {
    entries: RwLock<HashMap<CacheKey, CachedKeySet>>,
    refresh_locks: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    ttl: Duration,
    min_refresh_interval: Duration,
}

impl KeySetCache {
    /// Create a new key set cache with the given TTL and minimum interval between forced refreshes
    pub fn new(ttl: Duration, min_refresh_interval: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            refresh_locks: Mutex::new(HashMap::new()),
            ttl,
            min_refresh_interval,
        }
    }

    /// Get the key set for the fetcher's provider, fetching it if not cached or expired
    ///
    /// # Errors
    /// Returns the fetcher's `KeyFetchError` when a fetch is needed and fails
    pub async fn get(&self, fetcher: &KeySetFetcher) -> Result<Arc<KeySet>, KeyFetchError> {
        let key = cache_key(fetcher);
        if let Some(key_set) = self.try_get_cached(&key).await {
            return Ok(key_set);
        }

        let lock = self.refresh_lock(&key).await;
        let _guard = lock.lock().await;

        // Another caller may have refreshed while we were waiting
        if let Some(key_set) = self.try_get_cached(&key).await {
            debug!(provider = %key.0, url = %key.1, "Key set refreshed by a concurrent caller");
            return Ok(key_set);
        }

        self.fetch_and_store(fetcher).await
    }

    /// Force a refresh, e.g. after a token named a key id the cached set does not know
    ///
    /// If the key set was fetched less than the minimum refresh interval ago the
    /// cached set is returned instead, so a stream of tokens with bogus key ids
    /// cannot hammer the provider.
    ///
    /// # Errors
    /// Returns the fetcher's `KeyFetchError` when the fetch fails
    pub async fn refresh(&self, fetcher: &KeySetFetcher) -> Result<Arc<KeySet>, KeyFetchError> {
        let key = cache_key(fetcher);
        let lock = self.refresh_lock(&key).await;
        let _guard = lock.lock().await;

        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(&key) {
                if cached.is_younger_than(self.min_refresh_interval) {
                    debug!(provider = %key.0, "Key set refresh rate limited, using cache");
                    return Ok(Arc::clone(&cached.key_set));
                }
            }
        }

        self.fetch_and_store(fetcher).await
    }

    /// Drop the cached key set of the fetcher's provider and URL
    pub async fn invalidate(&self, fetcher: &KeySetFetcher) {
        self.entries.write().await.remove(&cache_key(fetcher));
    }

    /// Try to get the key set from cache if present and not expired
    async fn try_get_cached(&self, key: &CacheKey) -> Option<Arc<KeySet>> {
        let entries = self.entries.read().await;
        let cached = entries.get(key)?;

        if cached.is_expired(self.ttl) {
            return None;
        }

        Some(Arc::clone(&cached.key_set))
    }

    async fn refresh_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    async fn fetch_and_store(&self, fetcher: &KeySetFetcher) -> Result<Arc<KeySet>, KeyFetchError> {
        let cached = CachedKeySet::new(fetcher.fetch().await?);
        let key_set = Arc::clone(&cached.key_set);

        let mut entries = self.entries.write().await;
        entries.insert(cache_key(fetcher), cached);

        Ok(key_set)
    }
}
