use std::collections::HashSet;

use axum::{extract::State, Extension, Json};
use chrono::{Duration, Utc};
use promodb_core::normalize_code;
use promodb_ranking::{aggregate, rank_codes, RankedCode, SIGNAL_WINDOW_DAYS};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, require_domain, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct RankBody {
    #[serde(default)]
    pub domain: String,
    /// Candidate codes in caller order.
    #[serde(default)]
    pub codes: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(super) struct RankData {
    codes: Vec<RankedCode>,
    metadata: RankMetadata,
}

#[derive(Debug, Serialize)]
struct RankMetadata {
    domain: String,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

/// Normalised candidates, first occurrence wins.
fn distinct_candidates(codes: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    codes
        .iter()
        .map(|c| normalize_code(c))
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .collect()
}

fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

/// POST /api/v1/rank: score candidate codes against recent telemetry.
pub(super) async fn rank(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RankBody>,
) -> Result<Json<ApiResponse<RankData>>, ApiError> {
    let domain = require_domain(&req_id.0, &body.domain)?;
    let candidates = distinct_candidates(body.codes.as_deref().unwrap_or_default());

    if candidates.is_empty() {
        return Ok(Json(ApiResponse {
            data: RankData {
                codes: Vec::new(),
                metadata: RankMetadata {
                    domain,
                    count: 0,
                    reason: Some("no codes provided"),
                },
            },
            meta: ResponseMeta::new(req_id.0),
        }));
    }

    let now = Utc::now();
    let since = now - Duration::days(SIGNAL_WINDOW_DAYS);
    let records = promodb_db::list_attempt_records(&state.pool, &domain, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let seeds = promodb_db::seed_counts(&state.pool, &domain)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let stats = aggregate(&records, &domain, SIGNAL_WINDOW_DAYS, now);
    let mut ranked = rank_codes(&candidates, &stats, &seeds, now);
    for code in &mut ranked {
        code.score = round_score(code.score);
    }

    Ok(Json(ApiResponse {
        data: RankData {
            metadata: RankMetadata {
                domain,
                count: ranked.len(),
                reason: None,
            },
            codes: ranked,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
