//! Scrape and suggestion handlers.

use axum::{extract::State, Extension, Json};
use promodb_core::ScrapeSettings;
use promodb_ranking::{merge_suggestions, DEFAULT_SUGGEST_LIMIT};
use promodb_scraper::{ScrapeRequest, DEFAULT_SCRAPE_LIMIT};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, require_domain, ApiError, ApiResponse, AppState, ResponseMeta,
};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeBody {
    #[serde(default)]
    pub domain: String,
    pub url: Option<String>,
    pub html: Option<String>,
    pub limit: Option<usize>,
    /// Per-request heuristics laid over the retailer's configured ones.
    pub overrides: Option<ScrapeSettings>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SuggestBody {
    #[serde(default)]
    pub domain: String,
    pub url: Option<String>,
    pub html: Option<String>,
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct ScrapeData {
    domain: String,
    platform: String,
    codes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SuggestData {
    domain: String,
    codes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/scrape: candidate codes from supplied markup or live pages.
pub(super) async fn scrape_codes(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ScrapeBody>,
) -> Result<Json<ApiResponse<ScrapeData>>, ApiError> {
    let domain = require_domain(&req_id.0, &body.domain)?;
    let config = state
        .adapters
        .resolve_overridden(&domain, body.overrides.as_ref());

    let request = ScrapeRequest {
        domain: domain.clone(),
        url: body.url,
        html: body.html,
        limit: normalize_limit(body.limit, DEFAULT_SCRAPE_LIMIT),
    };
    let codes = promodb_scraper::scrape(&*state.cache, &config, &request).await;

    Ok(Json(ApiResponse {
        data: ScrapeData {
            domain,
            platform: config.platform,
            codes,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/suggest: catalog inventory, recent winners, scraped codes,
/// then seeds.
pub(super) async fn suggest_codes(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SuggestBody>,
) -> Result<Json<ApiResponse<SuggestData>>, ApiError> {
    let domain = require_domain(&req_id.0, &body.domain)?;
    let limit = normalize_limit(body.limit, DEFAULT_SUGGEST_LIMIT);
    let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let inventory = promodb_db::list_inventory_codes(&state.pool, &domain, row_limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let recent = promodb_db::list_recent_success_codes(&state.pool, &domain, row_limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let config = state.adapters.resolve(&domain);
    let request = ScrapeRequest {
        domain: domain.clone(),
        url: body.url,
        html: body.html,
        limit,
    };
    let scraped = promodb_scraper::scrape(&*state.cache, &config, &request).await;

    let seeds = promodb_db::list_seed_codes(&state.pool, &domain, row_limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let codes = merge_suggestions(&inventory, &recent, &scraped, &seeds, limit);

    Ok(Json(ApiResponse {
        data: SuggestData { domain, codes },
        meta: ResponseMeta::new(req_id.0),
    }))
}
