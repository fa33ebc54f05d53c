use alba_backend::BackendError;
use alba_common::{RouteError, ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;
use crate::assistant::AskError;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("a newer load replaced this one")]
    Superseded,
}

impl From<AskError> for ConsoleError {
    fn from(e: AskError) -> Self {
        match e {
            AskError::Validation(e) => ConsoleError::Validation(e),
            AskError::Backend(e) => ConsoleError::Backend(e),
        }
    }
}

impl ConsoleError {
    /// Needs the state because an authentication rejection ends the session.
    pub fn into_response_for(self, state: &AppState) -> Response {
        match self {
            ConsoleError::Backend(BackendError::Unauthorized) => {
                state.session.invalidate();
                Redirect::to("/login").into_response()
            }
            ConsoleError::Backend(e) => {
                tracing::warn!("backend call failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"error":"backend_error","message": e.to_string()})),
                )
                    .into_response()
            }
            ConsoleError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"error":"validation_failed","message": e.to_string()})),
            )
                .into_response(),
            ConsoleError::Route(e) => (
                StatusCode::NOT_FOUND,
                Json(json!({"error":"invalid_route","message": e.to_string()})),
            )
                .into_response(),
            ConsoleError::Superseded => (
                StatusCode::CONFLICT,
                Json(json!({"error":"superseded","message": "a newer load replaced this one"})),
            )
                .into_response(),
        }
    }
}
