//! Postgres-backed storage for the scrape fetch cache.

use promodb_core::CachedFetch;
use promodb_scraper::{CacheStore, ScraperError};
use sqlx::PgPool;

/// [`CacheStore`] over the `scrape_cache` table.
#[derive(Debug, Clone)]
pub struct PgCacheStore {
    pool: PgPool,
}

impl PgCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CacheStore for PgCacheStore {
    async fn get(&self, domain: &str, url: &str) -> Result<Option<CachedFetch>, ScraperError> {
        promodb_db::get_scrape_cache(&self.pool, domain, url)
            .await
            .map_err(|e| ScraperError::Store(Box::new(e)))
    }

    async fn put(&self, entry: CachedFetch) -> Result<(), ScraperError> {
        promodb_db::upsert_scrape_cache(&self.pool, &entry)
            .await
            .map_err(|e| ScraperError::Store(Box::new(e)))
    }
}
