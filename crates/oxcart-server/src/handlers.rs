//! Health and readiness endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::state::AppState;

/// `GET /health`: liveness. Answers as long as the process serves requests.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /health/ready`: readiness. Probes the user store so a broken
/// database connection reports 503 instead of accepting traffic it cannot
/// serve.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.users().count().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}
