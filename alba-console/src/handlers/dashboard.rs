use alba_backend::BackendError;
use alba_common::Instance;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::app::AppState;
use crate::dashboard::DashboardModel;
use crate::error::ConsoleError;

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    let token = state.token();
    let fetched = state.backend.list_instances(token.as_deref()).await;
    render(&state, fetched, None)
}

/// Asks the backend to reconcile instance states, then reloads everything.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Response {
    let token = state.token();
    let refresh_error = match state.backend.update_instance_status(token.as_deref()).await {
        Ok(()) => None,
        Err(BackendError::Unauthorized) => {
            return ConsoleError::from(BackendError::Unauthorized).into_response_for(&state)
        }
        Err(e) => {
            tracing::warn!("status refresh failed: {}", e);
            Some(format!("Could not refresh instance status: {}", e))
        }
    };

    state.detail.invalidate();
    let fetched = state.backend.list_instances(token.as_deref()).await;
    render(&state, fetched, refresh_error)
}

fn render(
    state: &AppState,
    fetched: Result<Vec<Instance>, BackendError>,
    refresh_error: Option<String>,
) -> Response {
    if let Err(BackendError::Unauthorized) = &fetched {
        return ConsoleError::from(BackendError::Unauthorized).into_response_for(state);
    }
    if let Err(e) = &fetched {
        tracing::warn!("instance fetch failed: {}", e);
    }

    let mut model = DashboardModel::from_fetch(state.session.current_user(), &fetched);
    if model.error.is_none() {
        model.error = refresh_error;
    }
    Json(model).into_response()
}
