//! Read access to the retailer catalog (`retailer_profiles`, `retailer_inventory`).
//!
//! Rows are written by external sync tooling and only read here.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// An active retailer with its inventory size, for coverage listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogSummaryRow {
    pub domain: String,
    pub retailer_name: String,
    pub platform: String,
    pub aliases: Json<Vec<String>>,
    pub regions: Json<Vec<String>>,
    pub inventory_count: i64,
    pub last_synced: Option<DateTime<Utc>>,
}

/// A row from the `retailer_profiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RetailerProfileRow {
    pub id: i64,
    pub domain: String,
    pub retailer_name: String,
    pub platform: String,
    pub aliases: Json<Vec<String>>,
    pub regions: Json<Vec<String>>,
    pub checkout_hints: Json<Vec<String>>,
    pub selectors: Value,
    pub heuristics: Value,
    pub scrape: Value,
    pub active: bool,
    pub last_synced: Option<DateTime<Utc>>,
}

/// A row from the `retailer_inventory` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InventoryRow {
    pub id: i64,
    pub retailer_id: i64,
    pub code: String,
    pub source: String,
    pub tags: Json<Vec<String>>,
    pub attributes: Value,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

const PROFILE_COLUMNS: &str = "id, domain, retailer_name, platform, aliases, regions, \
     checkout_hints, selectors, heuristics, scrape, active, last_synced";

const INVENTORY_COLUMNS: &str =
    "id, retailer_id, code, source, tags, attributes, first_seen, last_seen, expires_at";

/// Every active catalogued retailer, ordered by domain.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_catalog_coverage(pool: &PgPool) -> Result<Vec<CatalogSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, CatalogSummaryRow>(
        "SELECT p.domain, p.retailer_name, p.platform, p.aliases, p.regions, \
                COUNT(i.id) AS inventory_count, p.last_synced \
         FROM retailer_profiles p \
         LEFT JOIN retailer_inventory i ON i.retailer_id = p.id \
         WHERE p.active = TRUE \
         GROUP BY p.id \
         ORDER BY p.domain",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The active profile for `domain`, if catalogued.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_catalog_retailer(
    pool: &PgPool,
    domain: &str,
) -> Result<Option<RetailerProfileRow>, DbError> {
    let row = sqlx::query_as::<_, RetailerProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM retailer_profiles \
         WHERE domain = $1 AND active = TRUE"
    ))
    .bind(domain)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inventory entries for one retailer, most recently seen first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_retailer_inventory(
    pool: &PgPool,
    retailer_id: i64,
) -> Result<Vec<InventoryRow>, DbError> {
    let rows = sqlx::query_as::<_, InventoryRow>(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM retailer_inventory \
         WHERE retailer_id = $1 \
         ORDER BY last_seen DESC, id DESC"
    ))
    .bind(retailer_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Catalogued codes for `domain`, most recently seen first. Inactive or
/// unknown retailers yield an empty list.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_inventory_codes(
    pool: &PgPool,
    domain: &str,
    limit: i64,
) -> Result<Vec<String>, DbError> {
    let codes = sqlx::query_scalar::<_, String>(
        "SELECT i.code FROM retailer_inventory i \
         JOIN retailer_profiles p ON p.id = i.retailer_id \
         WHERE p.domain = $1 AND p.active = TRUE \
         ORDER BY i.last_seen DESC, i.id DESC \
         LIMIT $2",
    )
    .bind(domain)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(codes)
}
