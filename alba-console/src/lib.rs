// Library entry point for the console binary and its integration tests

pub mod app;
pub mod assistant;
pub mod auth;
pub mod auth_endpoints;
pub mod config;
pub mod dashboard;
pub mod detail_view;
pub mod error;
pub mod handlers;
pub mod log_stream;
pub mod routes;
pub mod session;

use axum::Router;
use std::sync::Arc;

pub use app::AppState;

/// Full application with state attached, as served by the binary.
pub fn build_app(state: Arc<AppState>) -> Router {
    let router = routes::create_router(state.clone());
    let router = if state.config.cors_permissive {
        router.layer(app::create_cors())
    } else {
        router
    };
    router.with_state(state)
}
