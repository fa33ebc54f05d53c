// Integration tests for the dashboard and status refresh
mod common;

use common::{signed_in_http, signed_in_mock};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_dashboard_aggregates_seeded_instances() {
    let (_, _, server) = signed_in_mock().await;

    let response = server.get("/").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();

    assert_eq!(body["total"], 6);
    assert_eq!(body["user"]["username"], "demo");
    assert!(body["error"].is_null());

    let clusters: Vec<(String, u64)> = body["clusters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| (c["key"].as_str().unwrap().to_string(), c["count"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        clusters,
        vec![
            ("1".to_string(), 3),
            ("2".to_string(), 2),
            ("no-cluster".to_string(), 1)
        ]
    );
    assert_eq!(body["clusters"][2]["href"], "/detail/cluster/no-cluster");
}

#[tokio::test]
async fn test_scenario_snapshot_over_http() {
    let backend_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/instances/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "provider": "aws", "status": "running", "cluster_id": 5},
            {"id": 2, "provider": "aws", "status": "stopped", "cluster_id": 5},
            {"id": 3, "provider": "gcp", "status": "running", "cluster_id": null}
        ])))
        .mount(&backend_server)
        .await;
    let (_, server) = signed_in_http(&backend_server).await;

    let body: Value = server.get("/").await.json();
    assert_eq!(body["clusters"][0]["key"], "5");
    assert_eq!(body["clusters"][0]["count"], 2);
    assert_eq!(body["clusters"][1]["key"], "no-cluster");

    let aws = &body["provider_status"][0];
    assert_eq!(aws["provider"], "aws");
    let statuses: Vec<(&str, u64)> = aws["slices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| (s["status"].as_str().unwrap(), s["count"].as_u64().unwrap()))
        .collect();
    assert_eq!(statuses, vec![("running", 1), ("stopped", 1)]);
}

#[tokio::test]
async fn test_fetch_failure_shows_error_with_empty_charts() {
    let backend_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/instances/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "database down"})))
        .mount(&backend_server)
        .await;
    let (_, server) = signed_in_http(&backend_server).await;

    let response = server.get("/").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["total"], 0);
    assert_eq!(body["clusters"], json!([]));
    assert_eq!(body["provider_status"], json!([]));
    assert!(body["error"].as_str().unwrap().contains("database down"));
}

#[tokio::test]
async fn test_refresh_reconciles_then_reloads() {
    let (_, _, server) = signed_in_mock().await;

    let before: Value = server.get("/").await.json();
    let gcp_before = before["provider_status"][1]["slices"].as_array().unwrap().len();
    assert_eq!(gcp_before, 3);

    let response = server.post("/refresh").await;
    assert_eq!(response.status_code(), 200);
    let after: Value = response.json();
    let gcp = &after["provider_status"][1];
    assert_eq!(gcp["provider"], "gcp");
    let statuses: Vec<&str> = gcp["slices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["running", "error"]);
}

#[tokio::test]
async fn test_refresh_failure_is_reported_not_fatal() {
    let backend_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/instances/update_status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&backend_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/instances/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "provider": "aws", "status": "running"}
        ])))
        .mount(&backend_server)
        .await;
    let (_, server) = signed_in_http(&backend_server).await;

    let body: Value = server.post("/refresh").await.json();
    assert_eq!(body["total"], 1);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Could not refresh instance status"));
}
