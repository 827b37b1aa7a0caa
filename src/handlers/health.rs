use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::handlers::AppState;

/// Liveness/readiness probe: reports whether the database answers a ping.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match crate::db::ping(state.db.as_ref()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up" })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        ),
    }
}
