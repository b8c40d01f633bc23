use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use common_http_errors::{ApiError, ApiResult};
use tracing::warn;

use crate::models::AcceptanceToken;
use crate::webhook::process_webhook;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/webhooks", post(handle_webhook))
        .route(
            "/acceptance-token",
            get(acceptance_token).post(acceptance_token),
        )
        .route("/metrics", get(metrics))
        .with_state(state)
}

pub async fn handle_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = process_webhook(&state.config, state.order_events.as_ref(), &body).await;
    state.metrics.record_webhook(outcome.label());
    (outcome.status(), outcome.body()).into_response()
}

pub async fn acceptance_token(State(state): State<AppState>) -> ApiResult<Json<AcceptanceToken>> {
    let result = state.gateway.client().acceptance_token().await;
    state.metrics.record_acceptance_token(result.is_ok());
    match result {
        Ok(token) => Ok(Json(token)),
        Err(err) => {
            warn!(error = %err, "Acceptance token unavailable");
            Err(ApiError::BadRequest {
                code: "acceptance_token_unavailable",
                message: Some(err.to_string()),
            })
        }
    }
}

async fn metrics(State(state): State<AppState>) -> ApiResult<Response> {
    state.metrics.render().map_err(ApiError::internal)
}
