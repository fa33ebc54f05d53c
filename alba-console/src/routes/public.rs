// Public routes (no session required)
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::app::AppState;
use crate::auth_endpoints;
use crate::handlers::health::health;

pub fn create_public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/login",
            get(auth_endpoints::login_page).post(auth_endpoints::login),
        )
        .route("/register", post(auth_endpoints::register))
        .route("/logout", post(auth_endpoints::logout))
}
