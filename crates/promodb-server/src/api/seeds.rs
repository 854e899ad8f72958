use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, require_domain, ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_SEED_SOURCE: &str = "seed";
const MAX_SOURCE_CHARS: usize = 50;

fn default_source() -> String {
    DEFAULT_SEED_SOURCE.to_string()
}

#[derive(Debug, Deserialize)]
pub(super) struct SeedBody {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub codes: Vec<String>,
    #[serde(default = "default_source")]
    pub source: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SeedData {
    domain: String,
    added: u32,
    skipped: u32,
}

/// POST /api/v1/seeds: register known codes for a domain.
pub(super) async fn create_seeds(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SeedBody>,
) -> Result<(StatusCode, Json<ApiResponse<SeedData>>), ApiError> {
    let rid = &req_id.0;
    let domain = require_domain(rid, &body.domain)?;

    let source = body.source.trim();
    if source.is_empty() || source.chars().count() > MAX_SOURCE_CHARS {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("source must be 1-{MAX_SOURCE_CHARS} characters"),
        ));
    }

    let counts = promodb_db::insert_seeds(&state.pool, &domain, &body.codes, source)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        domain = %domain,
        added = counts.added,
        skipped = counts.skipped,
        "seeds inserted"
    );

    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: SeedData {
                domain,
                added: counts.added,
                skipped: counts.skipped,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
