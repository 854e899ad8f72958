mod catalog;
mod events;
mod rank;
mod scrape;
mod seeds;

use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use promodb_core::{normalize_domain, AdaptersFile, AppConfig};
use promodb_ranking::PruneThrottle;
use promodb_scraper::{FetchCache, HttpFetcher};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::stores::PgCacheStore;

/// Upper bound on any `limit` accepted from a request body.
const MAX_CODES_LIMIT: usize = 200;

pub type SharedFetchCache = Arc<FetchCache<PgCacheStore, HttpFetcher>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub adapters: Arc<AdaptersFile>,
    pub cache: SharedFetchCache,
    pub prune: Arc<PruneThrottle>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_CODES_LIMIT)
}

/// Normalise `raw` and reject it when nothing is left.
pub(super) fn require_domain(request_id: &str, raw: &str) -> Result<String, ApiError> {
    let domain = normalize_domain(raw);
    if domain.is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "domain is required",
        ));
    }
    Ok(domain)
}

pub(super) fn map_db_error(request_id: String, error: &promodb_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn public_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/scrape", post(scrape::scrape_codes))
        .route("/api/v1/suggest", post(scrape::suggest_codes))
        .route("/api/v1/rank", post(rank::rank))
        .route("/api/v1/events", post(events::record_event))
        .route("/api/v1/catalog/coverage", get(catalog::catalog_coverage))
        .route("/api/v1/catalog/{domain}", get(catalog::catalog_detail))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/seeds", post(seeds::create_seeds))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let open_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/adapters", get(adapters));

    Router::new()
        .merge(open_routes)
        .merge(public_router(rate_limit.clone()))
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match promodb_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

/// GET /api/v1/adapters: the loaded platform defaults and retailer overrides.
async fn adapters(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<AdaptersFile>> {
    Json(ApiResponse {
        data: AdaptersFile::clone(&state.adapters),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
