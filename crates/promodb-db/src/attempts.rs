//! Database operations for `code_attempts`.

use chrono::{DateTime, Utc};
use promodb_core::AttemptRecord;
use promodb_ranking::NewAttempt;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `code_attempts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttemptRow {
    pub id: i64,
    pub domain: String,
    pub code: String,
    pub success: bool,
    pub saved: Decimal,
    pub before_total: Option<Decimal>,
    pub after_total: Option<Decimal>,
    /// Hex SHA-256 of the client's anonymous id, never the raw value.
    pub anon_id: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AttemptRow {
    /// The subset of columns the ranking side aggregates over.
    #[must_use]
    pub fn to_record(&self) -> AttemptRecord {
        AttemptRecord {
            domain: self.domain.clone(),
            code: self.code.clone(),
            success: self.success,
            saved: self.saved.to_f64(),
            created_at: self.created_at,
        }
    }
}

const ATTEMPT_COLUMNS: &str = "id, domain, code, success, saved, before_total, after_total, \
                               anon_id, user_agent, created_at";

fn to_amount(field: &'static str, value: f64) -> Result<Decimal, DbError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .ok_or(DbError::InvalidAmount { field, value })
}

fn to_optional_amount(field: &'static str, value: Option<f64>) -> Result<Option<Decimal>, DbError> {
    value.map(|v| to_amount(field, v)).transpose()
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts one attempt and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::InvalidAmount`] for non-finite money values, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_attempt(pool: &PgPool, attempt: &NewAttempt) -> Result<AttemptRow, DbError> {
    let saved = to_amount("saved", attempt.saved)?;
    let before_total = to_optional_amount("before_total", attempt.before_total)?;
    let after_total = to_optional_amount("after_total", attempt.after_total)?;

    let row = sqlx::query_as::<_, AttemptRow>(&format!(
        "INSERT INTO code_attempts \
             (domain, code, success, saved, before_total, after_total, anon_id, user_agent) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {ATTEMPT_COLUMNS}"
    ))
    .bind(&attempt.domain)
    .bind(&attempt.code)
    .bind(attempt.success)
    .bind(saved)
    .bind(before_total)
    .bind(after_total)
    .bind(attempt.anon_id_hash.as_deref())
    .bind(attempt.user_agent.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Deletes every attempt created before `cutoff`. Returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_attempts_before(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM code_attempts WHERE created_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Attempts for `domain` created at or after `since`, as ranking records.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_attempt_records(
    pool: &PgPool,
    domain: &str,
    since: DateTime<Utc>,
) -> Result<Vec<AttemptRecord>, DbError> {
    let rows = sqlx::query_as::<_, AttemptRow>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM code_attempts \
         WHERE domain = $1 AND created_at >= $2 \
         ORDER BY created_at"
    ))
    .bind(domain)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(AttemptRow::to_record).collect())
}

/// Distinct codes that succeeded for `domain`, most recent success first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_success_codes(
    pool: &PgPool,
    domain: &str,
    limit: i64,
) -> Result<Vec<String>, DbError> {
    let codes = sqlx::query_scalar::<_, String>(
        "SELECT code FROM code_attempts \
         WHERE domain = $1 AND success = TRUE \
         GROUP BY code \
         ORDER BY MAX(created_at) DESC \
         LIMIT $2",
    )
    .bind(domain)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(codes)
}

/// Attempts newest first, optionally restricted to one domain and to rows
/// created at or after `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_training_rows(
    pool: &PgPool,
    domain: Option<&str>,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<AttemptRow>, DbError> {
    let rows = sqlx::query_as::<_, AttemptRow>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM code_attempts \
         WHERE ($1::TEXT IS NULL OR domain = $1) \
           AND ($2::TIMESTAMPTZ IS NULL OR created_at >= $2) \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(domain)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
