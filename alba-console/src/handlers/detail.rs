use alba_common::DetailFilter;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::app::AppState;
use crate::detail_view::LoadOutcome;
use crate::error::ConsoleError;

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path((mode, key)): Path<(String, String)>,
) -> Response {
    render(&state, &mode, &key, None).await
}

pub async fn detail_with_status(
    State(state): State<Arc<AppState>>,
    Path((mode, key, status)): Path<(String, String, String)>,
) -> Response {
    render(&state, &mode, &key, Some(&status)).await
}

async fn render(state: &AppState, mode: &str, key: &str, status: Option<&str>) -> Response {
    let filter = match DetailFilter::from_route(mode, key, status) {
        Ok(filter) => filter,
        Err(e) => return ConsoleError::from(e).into_response_for(state),
    };

    let token = state.token();
    match state.detail.load(filter, token.as_deref()).await {
        Ok(LoadOutcome::Ready(page)) => Json(page.as_ref()).into_response(),
        Ok(LoadOutcome::Superseded) => ConsoleError::Superseded.into_response_for(state),
        Err(e) => ConsoleError::from(e).into_response_for(state),
    }
}
