use alba_common::RegisterForm;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::auth::sanitize_next;
use crate::error::ConsoleError;
use crate::session::SessionError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub authenticated: bool,
    pub next: Option<String>,
    pub error: Option<String>,
}

pub async fn login_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NextQuery>,
) -> impl IntoResponse {
    let next = sanitize_next(query.next.as_deref());
    if state.session.is_authenticated() {
        return Redirect::to(next.as_deref().unwrap_or("/")).into_response();
    }
    Json(LoginView {
        authenticated: false,
        next,
        error: state.session.last_error(),
    })
    .into_response()
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NextQuery>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error":"invalid_request","message":"username and password are required"})),
        )
            .into_response();
    }

    match state.session.login(&req.username, &req.password).await {
        Ok(_) => {
            let target = sanitize_next(query.next.as_deref()).unwrap_or_else(|| "/".to_string());
            Redirect::to(&target).into_response()
        }
        Err(SessionError::Backend(e)) => {
            tracing::warn!("login could not reach the backend: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error":"backend_error","message": e.to_string()})),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_credentials","message": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RegisterForm>,
) -> impl IntoResponse {
    match state.session.register(form).await {
        Ok(user) => (StatusCode::CREATED, Json(json!(user))).into_response(),
        Err(SessionError::Validation(e)) => ConsoleError::from(e).into_response_for(&state),
        Err(SessionError::Backend(e)) => match e {
            alba_backend::BackendError::Status { status, message } if status < 500 => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error":"registration_rejected","message": message})),
            )
                .into_response(),
            other => (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error":"backend_error","message": other.to_string()})),
            )
                .into_response(),
        },
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error":"invalid_request","message": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.session.logout();
    Redirect::to("/login")
}

pub async fn me(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.session.current_user() {
        Some(user) => Json(json!(user)).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"unauthorized","message":"login_required"})),
        )
            .into_response(),
    }
}
