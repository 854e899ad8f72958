//! Database operations for `scrape_cache`.

use chrono::{DateTime, Utc};
use promodb_core::CachedFetch;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `scrape_cache` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeCacheRow {
    pub id: i64,
    pub domain: String,
    pub url: String,
    pub codes: Json<Vec<String>>,
    pub fetched_at: DateTime<Utc>,
}

impl From<ScrapeCacheRow> for CachedFetch {
    fn from(row: ScrapeCacheRow) -> Self {
        CachedFetch {
            domain: row.domain,
            url: row.url,
            codes: row.codes.0,
            fetched_at: row.fetched_at,
        }
    }
}

/// Returns the cached entry for `(domain, url)`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_scrape_cache(
    pool: &PgPool,
    domain: &str,
    url: &str,
) -> Result<Option<CachedFetch>, DbError> {
    let row = sqlx::query_as::<_, ScrapeCacheRow>(
        "SELECT id, domain, url, codes, fetched_at FROM scrape_cache \
         WHERE domain = $1 AND url = $2",
    )
    .bind(domain)
    .bind(url)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(CachedFetch::from))
}

/// Inserts or overwrites the entry for `(entry.domain, entry.url)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_scrape_cache(pool: &PgPool, entry: &CachedFetch) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO scrape_cache (domain, url, codes, fetched_at) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (domain, url) DO UPDATE \
         SET codes = EXCLUDED.codes, fetched_at = EXCLUDED.fetched_at",
    )
    .bind(&entry.domain)
    .bind(&entry.url)
    .bind(Json(&entry.codes))
    .bind(entry.fetched_at)
    .execute(pool)
    .await?;

    Ok(())
}
