use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::app::AppState;
use crate::error::ConsoleError;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub description: String,
}

pub async fn transcript(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({"messages": state.assistant.messages()}))
}

pub async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Response {
    let token = state.token();
    match state
        .assistant
        .ask(state.backend.as_ref(), token.as_deref(), &req.description)
        .await
    {
        Ok(reply) => Json(json!({"reply": reply, "messages": state.assistant.messages()})).into_response(),
        Err(e) => ConsoleError::from(e).into_response_for(&state),
    }
}
