use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::Utc;
use promodb_ranking::{prepare_attempt, AttemptInput};
use serde::Serialize;

use crate::middleware::RequestId;
use crate::prune::run_prune;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct EventData {
    stored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

/// POST /api/v1/events: record whether a code worked at checkout.
///
/// Opted-out reports are acknowledged with 202 and not stored. The client's
/// `User-Agent` header is used when the body does not carry one.
pub(super) async fn record_event(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(mut body): Json<AttemptInput>,
) -> Result<(StatusCode, Json<ApiResponse<EventData>>), ApiError> {
    if body.user_agent.is_none() {
        body.user_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
    }

    let attempt = prepare_attempt(&body)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let Some(attempt) = attempt else {
        return Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse {
                data: EventData {
                    stored: false,
                    id: None,
                    reason: Some("opt_out"),
                },
                meta: ResponseMeta::new(req_id.0),
            }),
        ));
    };

    let row = promodb_db::insert_attempt(&state.pool, &attempt)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    run_prune(
        &state.pool,
        &state.prune,
        state.config.event_retention_days,
        Utc::now(),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: EventData {
                stored: true,
                id: Some(row.id),
                reason: None,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
