//! Database operations for `code_seeds`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use promodb_core::{normalize_code, normalize_domain};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `code_seeds` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeedRow {
    pub id: i64,
    pub domain: String,
    pub code: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedCounts {
    pub added: u32,
    pub skipped: u32,
}

/// Normalises and inserts `codes` for `domain`. Blank codes are ignored;
/// pairs that already exist are counted as skipped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if an insert fails.
pub async fn insert_seeds(
    pool: &PgPool,
    domain: &str,
    codes: &[String],
    source: &str,
) -> Result<SeedCounts, DbError> {
    let domain = normalize_domain(domain);
    let mut counts = SeedCounts::default();

    for raw in codes {
        let code = normalize_code(raw);
        if code.is_empty() {
            continue;
        }

        let result = sqlx::query(
            "INSERT INTO code_seeds (domain, code, source) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (domain, code) DO NOTHING",
        )
        .bind(&domain)
        .bind(&code)
        .bind(source)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            counts.skipped += 1;
        } else {
            counts.added += 1;
        }
    }

    Ok(counts)
}

/// Number of seed rows per code for `domain`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn seed_counts(pool: &PgPool, domain: &str) -> Result<HashMap<String, u32>, DbError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT code, COUNT(*) FROM code_seeds WHERE domain = $1 GROUP BY code",
    )
    .bind(domain)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(code, n)| (code, u32::try_from(n).unwrap_or(u32::MAX)))
        .collect())
}

/// Seeded codes for `domain`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_seed_codes(pool: &PgPool, domain: &str, limit: i64) -> Result<Vec<String>, DbError> {
    let codes = sqlx::query_scalar::<_, String>(
        "SELECT code FROM code_seeds \
         WHERE domain = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(domain)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(codes)
}
