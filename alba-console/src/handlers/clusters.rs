use alba_common::ClusterForm;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::app::AppState;
use crate::error::ConsoleError;
use crate::log_stream;

/// Validates locally; an invalid form never reaches the backend.
pub async fn create_cluster(
    State(state): State<Arc<AppState>>,
    Json(form): Json<ClusterForm>,
) -> Response {
    let request = match form.into_request() {
        Ok(request) => request,
        Err(e) => return ConsoleError::from(e).into_response_for(&state),
    };

    log_stream::spawn_follow(
        state.logs.clone(),
        &state.config.logs_ws_url,
        &request.name,
        log_stream::FollowLimits {
            connect: state.config.http_timeout,
            idle: state.config.logs_idle_timeout,
        },
    );

    let token = state.token();
    match state.backend.create_cluster(token.as_deref(), &request).await {
        Ok(cluster) => {
            tracing::info!("cluster {} ({}) requested", cluster.name, cluster.id);
            state.detail.invalidate();
            (StatusCode::CREATED, Json(json!(cluster))).into_response()
        }
        Err(e) => ConsoleError::from(e).into_response_for(&state),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub cluster: Option<String>,
}

pub async fn cluster_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> impl IntoResponse {
    Json(json!({"lines": state.logs.recent(query.cluster.as_deref())}))
}
