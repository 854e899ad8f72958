//! Read-only retailer catalog handlers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use promodb_db::{CatalogSummaryRow, InventoryRow, RetailerProfileRow};
use serde::Serialize;
use sqlx::types::JsonValue;

use crate::middleware::RequestId;

use super::{map_db_error, require_domain, ApiError, ApiResponse, AppState, ResponseMeta};

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct CoverageData {
    total: usize,
    retailers: Vec<RetailerSummary>,
}

#[derive(Debug, Serialize)]
pub(super) struct RetailerSummary {
    domain: String,
    retailer: String,
    platform: String,
    aliases: Vec<String>,
    regions: Vec<String>,
    inventory: i64,
    last_synced: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct RetailerDetail {
    domain: String,
    retailer: String,
    platform: String,
    checkout_hints: Vec<String>,
    selectors: JsonValue,
    heuristics: JsonValue,
    scrape: JsonValue,
    regions: Vec<String>,
    aliases: Vec<String>,
    inventory: Vec<InventoryEntry>,
    inventory_count: usize,
    last_synced: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct InventoryEntry {
    code: String,
    source: String,
    tags: Vec<String>,
    attributes: JsonValue,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl From<CatalogSummaryRow> for RetailerSummary {
    fn from(row: CatalogSummaryRow) -> Self {
        Self {
            domain: row.domain,
            retailer: row.retailer_name,
            platform: row.platform,
            aliases: row.aliases.0,
            regions: row.regions.0,
            inventory: row.inventory_count,
            last_synced: row.last_synced,
        }
    }
}

impl From<InventoryRow> for InventoryEntry {
    fn from(row: InventoryRow) -> Self {
        Self {
            code: row.code,
            source: row.source,
            tags: row.tags.0,
            attributes: row.attributes,
            first_seen: row.first_seen,
            last_seen: row.last_seen,
            expires_at: row.expires_at,
        }
    }
}

impl RetailerDetail {
    fn new(profile: RetailerProfileRow, inventory: Vec<InventoryRow>) -> Self {
        let inventory: Vec<InventoryEntry> = inventory.into_iter().map(InventoryEntry::from).collect();
        Self {
            domain: profile.domain,
            retailer: profile.retailer_name,
            platform: profile.platform,
            checkout_hints: profile.checkout_hints.0,
            selectors: profile.selectors,
            heuristics: profile.heuristics,
            scrape: profile.scrape,
            regions: profile.regions.0,
            aliases: profile.aliases.0,
            inventory_count: inventory.len(),
            inventory,
            last_synced: profile.last_synced,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/catalog/coverage: active catalogued retailers.
pub(super) async fn catalog_coverage(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<CoverageData>>, ApiError> {
    let rows = promodb_db::list_catalog_coverage(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let retailers: Vec<RetailerSummary> = rows.into_iter().map(RetailerSummary::from).collect();
    Ok(Json(ApiResponse {
        data: CoverageData {
            total: retailers.len(),
            retailers,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/catalog/{domain}: one retailer's profile and inventory.
pub(super) async fn catalog_detail(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_domain): Path<String>,
) -> Result<Json<ApiResponse<RetailerDetail>>, ApiError> {
    let domain = require_domain(&req_id.0, &raw_domain)?;

    let profile = promodb_db::get_catalog_retailer(&state.pool, &domain)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "catalog entry not found"))?;

    let inventory = promodb_db::list_retailer_inventory(&state.pool, profile.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: RetailerDetail::new(profile, inventory),
        meta: ResponseMeta::new(req_id.0),
    }))
}
