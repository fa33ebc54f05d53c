use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::app::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.backend.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status":"ok","backend":"reachable"})),
        ),
        Err(e) => {
            tracing::debug!("backend health check failed: {}", e);
            (
                StatusCode::OK,
                Json(json!({"status":"degraded","backend":"unreachable","message": e.to_string()})),
            )
        }
    }
}
