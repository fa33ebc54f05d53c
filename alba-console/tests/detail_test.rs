// Integration tests for the drill-down view
mod common;

use common::{signed_in_http, signed_in_mock};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_status_drill_down_filters_and_titles() {
    let (_, _, server) = signed_in_mock().await;

    let response = server.get("/detail/status/aws/running").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["title"], "Running instances on AWS");
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["provider"] == "aws" && r["status"] == "running"));
    assert_eq!(rows[0]["status_color"], "#63f1b1");
    assert_eq!(rows[0]["master"]["label"], "3.120.10.4");
    assert_eq!(rows[0]["master"]["url"], "http://3.120.10.4");
}

#[tokio::test]
async fn test_failed_lookup_degrades_only_that_cluster() {
    let backend_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/instances/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "provider": "aws", "status": "running", "cluster_id": 5},
            {"id": 2, "provider": "aws", "status": "running", "cluster_id": 6},
            {"id": 3, "provider": "aws", "status": "running", "cluster_id": 5},
            {"id": 4, "provider": "aws", "status": "running"}
        ])))
        .mount(&backend_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/clusters/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "name": "web",
            "network_config": {"master_ip": "10.0.0.5"}
        })))
        .expect(1)
        .mount(&backend_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/clusters/6"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&backend_server)
        .await;
    let (_, server) = signed_in_http(&backend_server).await;

    let response = server.get("/detail/provider/aws").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let masters: Vec<(String, Value)> = body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| (r["id"].as_str().unwrap().to_string(), r["master"].clone()))
        .collect();

    assert_eq!(masters[0].1["label"], "10.0.0.5");
    assert!(masters[1].1.is_null());
    assert_eq!(masters[2].1["label"], "10.0.0.5");
    assert!(masters[3].1.is_null());
}

#[tokio::test]
async fn test_unassigned_cluster_drill_down() {
    let (_, _, server) = signed_in_mock().await;

    let body: Value = server.get("/detail/cluster-status/no-cluster/error").await.json();
    assert_eq!(body["title"], "Error instances without cluster");
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);
    assert_eq!(body["rows"][0]["cluster_key"], "no-cluster");
}

#[tokio::test]
async fn test_invalid_routes_are_not_found() {
    let (_, _, server) = signed_in_mock().await;

    let unknown = server.get("/detail/zone/eu").await;
    assert_eq!(unknown.status_code(), 404);
    let body: Value = unknown.json();
    assert_eq!(body["error"], "invalid_route");

    // Status mode without a status segment is a routing error, not "everything".
    let missing = server.get("/detail/status/aws").await;
    assert_eq!(missing.status_code(), 404);
}

#[tokio::test]
async fn test_primary_fetch_failure_is_bad_gateway() {
    let backend_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/instances/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .mount(&backend_server)
        .await;
    let (_, server) = signed_in_http(&backend_server).await;

    let response = server.get("/detail/provider/aws").await;
    assert_eq!(response.status_code(), 502);
    let body: Value = response.json();
    assert_eq!(body["error"], "backend_error");
    assert!(body.get("rows").is_none());
}
