// Integration tests for the public health endpoint
mod common;

use common::{create_test_server, mock_state, test_state};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_health_is_public_and_reachable() {
    let (_, state) = mock_state();
    let server = create_test_server(state);

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "reachable");
}

#[tokio::test]
async fn test_health_reports_degraded_backend() {
    let backend_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({"detail": "db down"})))
        .expect(1)
        .mount(&backend_server)
        .await;

    let server = create_test_server(test_state(common::http_backend(&backend_server)));

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["backend"], "unreachable");
    assert_eq!(body["message"], "backend returned 503: db down");
}
