use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use promodb_core::CachedFetch;
use tokio::sync::Mutex;

use crate::error::ScraperError;
use crate::extract::TokenRules;
use crate::fetch::{fetch_and_scrape, PageFetcher};

/// Maximum number of codes persisted per cache entry. Callers still receive
/// the full scrape result.
pub const MAX_STORED_CODES: usize = 50;

/// Backing storage for [`FetchCache`] entries, keyed by `(domain, url)`.
pub trait CacheStore: Send + Sync {
    fn get(
        &self,
        domain: &str,
        url: &str,
    ) -> impl Future<Output = Result<Option<CachedFetch>, ScraperError>> + Send;

    /// Insert or overwrite the entry for `(entry.domain, entry.url)`.
    fn put(&self, entry: CachedFetch) -> impl Future<Output = Result<(), ScraperError>> + Send;
}

/// Process-local [`CacheStore`], used by the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<(String, String), CachedFetch>>,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl CacheStore for MemoryCacheStore {
    async fn get(&self, domain: &str, url: &str) -> Result<Option<CachedFetch>, ScraperError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(&(domain.to_string(), url.to_string()))
            .cloned())
    }

    async fn put(&self, entry: CachedFetch) -> Result<(), ScraperError> {
        let mut entries = self.entries.lock().await;
        entries.insert((entry.domain.clone(), entry.url.clone()), entry);
        Ok(())
    }
}

type KeyLock = Arc<Mutex<()>>;

/// TTL cache of scraped code lists in front of a [`PageFetcher`].
///
/// Lookups for the same `(domain, url)` are serialized so that concurrent
/// callers trigger at most one live fetch per expiry.
pub struct FetchCache<S, F> {
    store: S,
    fetcher: F,
    ttl: chrono::Duration,
    key_locks: Mutex<HashMap<(String, String), KeyLock>>,
}

impl<S: CacheStore, F: PageFetcher> FetchCache<S, F> {
    pub fn new(store: S, fetcher: F, ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);
        Self {
            store,
            fetcher,
            ttl,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Return cached codes for `(domain, url)` when fresh, otherwise fetch,
    /// scrape, store, and return the live result.
    pub async fn cached_fetch(&self, domain: &str, url: &str, rules: &TokenRules) -> Vec<String> {
        self.cached_fetch_at(domain, url, rules, Utc::now()).await
    }

    /// [`Self::cached_fetch`] with an explicit clock reading.
    pub async fn cached_fetch_at(
        &self,
        domain: &str,
        url: &str,
        rules: &TokenRules,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let key = (domain.to_string(), url.to_string());
        let key_lock = {
            let mut locks = self.key_locks.lock().await;
            Arc::clone(locks.entry(key.clone()).or_default())
        };

        let codes = {
            let _guard = key_lock.lock().await;
            self.lookup_or_fetch(domain, url, rules, now).await
        };

        let mut locks = self.key_locks.lock().await;
        // one reference held here, one by the map
        if Arc::strong_count(&key_lock) == 2 {
            locks.remove(&key);
        }

        codes
    }

    async fn lookup_or_fetch(
        &self,
        domain: &str,
        url: &str,
        rules: &TokenRules,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        match self.store.get(domain, url).await {
            Ok(Some(entry)) if now - entry.fetched_at < self.ttl => {
                tracing::debug!(domain, url, "fetch cache hit");
                return entry.codes;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(domain, url, error = %e, "fetch cache lookup failed");
            }
        }

        let codes = fetch_and_scrape(&self.fetcher, url, rules).await;

        let entry = CachedFetch {
            domain: domain.to_string(),
            url: url.to_string(),
            codes: codes.iter().take(MAX_STORED_CODES).cloned().collect(),
            fetched_at: now,
        };
        if let Err(e) = self.store.put(entry).await {
            tracing::warn!(domain, url, error = %e, "fetch cache store failed");
        }

        codes
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
