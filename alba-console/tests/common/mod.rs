// Common test utilities and fixtures
#![allow(dead_code)]

use alba_backend::{ClusterBackend, HttpBackend, HttpBackendConfig, MockBackend};
use alba_console::config::ConsoleConfig;
use alba_console::session::MemoryTokenStore;
use alba_console::{build_app, AppState};
use axum_test::TestServer;
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

/// Nothing listens on the discard port, so log streams fail fast.
pub const UNREACHABLE_LOGS: &str = "ws://127.0.0.1:9/ws/logs/{cluster}";

pub fn test_config() -> ConsoleConfig {
    ConsoleConfig {
        logs_ws_url: UNREACHABLE_LOGS.to_string(),
        lookup_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

pub fn test_state(backend: Arc<dyn ClusterBackend>) -> Arc<AppState> {
    AppState::new(backend, Arc::new(MemoryTokenStore::default()), test_config())
}

pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    TestServer::new(build_app(state)).unwrap()
}

/// Seeded demo backend, not signed in.
pub fn mock_state() -> (Arc<MockBackend>, Arc<AppState>) {
    let backend = Arc::new(MockBackend::seeded());
    let state = test_state(backend.clone());
    (backend, state)
}

/// Seeded demo backend with the operator already signed in as `demo`.
pub async fn signed_in_mock() -> (Arc<MockBackend>, Arc<AppState>, TestServer) {
    let (backend, state) = mock_state();
    state.session.login("demo", "demo").await.unwrap();
    let server = create_test_server(state.clone());
    (backend, state, server)
}

pub fn http_backend(server: &MockServer) -> Arc<dyn ClusterBackend> {
    Arc::new(
        HttpBackend::new(HttpBackendConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap(),
    )
}

/// Mounts a login + me pair that accepts `demo`/`demo` with token `tok-demo`.
pub async fn mount_auth(server: &MockServer) {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, ResponseTemplate};

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({"username": "demo", "password": "demo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-demo"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 1, "username": "demo", "role": "admin"})),
        )
        .mount(server)
        .await;
}

/// HTTP backend against `server`, signed in through it.
pub async fn signed_in_http(server: &MockServer) -> (Arc<AppState>, TestServer) {
    mount_auth(server).await;
    let state = test_state(http_backend(server));
    state.session.login("demo", "demo").await.unwrap();
    let test_server = create_test_server(state.clone());
    (state, test_server)
}
