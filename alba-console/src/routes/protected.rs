// Protected routes (require the operator session)
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::app::AppState;
use crate::auth;
use crate::auth_endpoints;
use crate::handlers::{assistant, clusters, dashboard, detail};

pub fn create_protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/refresh", post(dashboard::refresh))
        .route("/me", get(auth_endpoints::me))
        // Drill-downs: /detail/provider/aws, /detail/status/aws/running, ...
        .route("/detail/{mode}/{key}", get(detail::detail))
        .route("/detail/{mode}/{key}/{status}", get(detail::detail_with_status))
        .route("/clusters", post(clusters::create_cluster))
        .route("/clusters/logs", get(clusters::cluster_logs))
        .route(
            "/assistant",
            get(assistant::transcript).post(assistant::ask),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_session,
        ))
}
