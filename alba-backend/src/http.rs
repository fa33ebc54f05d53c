use alba_common::{Cluster, CreateClusterRequest, Instance, NewUser, User};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{AssistantReply, BackendError, ClusterBackend, Result};

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    /// Applied to every request; expiry surfaces as `BackendError::Timeout`.
    pub timeout: Duration,
    pub login_path: String,
    pub me_path: String,
    pub register_path: String,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(15),
            login_path: "/api/v1/auth/login".to_string(),
            me_path: "/api/v1/auth/me".to_string(),
            register_path: "/api/v1/auth/register".to_string(),
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Serialize)]
struct AutoClusterRequest<'a> {
    description: &'a str,
}

/// Talks to the real cluster-management API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: HttpBackendConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = check(request.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Maps non-success statuses onto the error taxonomy.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::Unauthorized);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::from_body(
        status.as_u16(),
        &body,
        status.canonical_reason().unwrap_or("request failed"),
    ))
}

#[async_trait]
impl ClusterBackend for HttpBackend {
    async fn login(&self, username: &str, password: &str) -> Result<String> {
        let request = self
            .client
            .post(self.url(&self.config.login_path))
            .json(&LoginRequest { username, password });
        let response: LoginResponse = self.fetch(request).await?;
        if response.access_token.trim().is_empty() {
            return Err(BackendError::Decode("login response carried an empty token".to_string()));
        }
        Ok(response.access_token)
    }

    async fn current_user(&self, token: &str) -> Result<User> {
        let request = self.client.get(self.url(&self.config.me_path)).bearer_auth(token);
        self.fetch(request).await
    }

    async fn register(&self, user: &NewUser) -> Result<User> {
        let request = self.client.post(self.url(&self.config.register_path)).json(user);
        self.fetch(request).await
    }

    async fn health(&self) -> Result<()> {
        check(self.client.get(self.url("/health")).send().await?).await?;
        Ok(())
    }

    async fn list_clusters(&self, token: Option<&str>) -> Result<Vec<Cluster>> {
        let request = self.authed(self.client.get(self.url("/api/v1/clusters/")), token);
        self.fetch(request).await
    }

    async fn list_instances(&self, token: Option<&str>) -> Result<Vec<Instance>> {
        let request = self.authed(self.client.get(self.url("/api/v1/instances/")), token);
        self.fetch(request).await
    }

    async fn get_cluster(&self, token: Option<&str>, id: &str) -> Result<Cluster> {
        let path = format!("/api/v1/clusters/{}", urlencoding::encode(id));
        let request = self.authed(self.client.get(self.url(&path)), token);
        self.fetch(request).await
    }

    async fn create_cluster(
        &self,
        token: Option<&str>,
        request: &CreateClusterRequest,
    ) -> Result<Cluster> {
        let builder = self
            .client
            .post(self.url("/api/v1/clusters/"))
            .json(request);
        self.fetch(self.authed(builder, token)).await
    }

    async fn update_instance_status(&self, token: Option<&str>) -> Result<()> {
        let request = self.authed(
            self.client.post(self.url("/api/v1/instances/update_status")),
            token,
        );
        check(request.send().await?).await?;
        Ok(())
    }

    async fn auto_cluster(&self, token: Option<&str>, description: &str) -> Result<AssistantReply> {
        let request = self.authed(
            self.client
                .post(self.url("/api/v1/instances/auto-cluster"))
                .json(&AutoClusterRequest { description }),
            token,
        );
        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await?;
        Ok(AssistantReply::interpret(status, &content_type, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alba_common::{InstanceStatus, Provider};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> HttpBackend {
        HttpBackend::new(HttpBackendConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_then_me() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .and(body_json(json!({"username": "demo", "password": "demo"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "tok-1", "token_type": "bearer"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "username": "demo"})))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let token = backend.login("demo", "demo").await.unwrap();
        assert_eq!(token, "tok-1");
        let user = backend.current_user(&token).await.unwrap();
        assert_eq!(user.username, "demo");
    }

    #[tokio::test]
    async fn test_unauthorized_is_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/instances/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
            .mount(&server)
            .await;

        let err = backend_for(&server).list_instances(Some("old")).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_list_instances_parses_loose_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/instances/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "provider": "aws", "status": "running", "cluster_id": 5},
                {"id": 2, "provider": "gcp", "status": "pending", "cluster_id": null}
            ])))
            .mount(&server)
            .await;

        let instances = backend_for(&server).list_instances(None).await.unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].provider, Provider::Aws);
        assert_eq!(instances[1].status, InstanceStatus::Pending);
        assert!(instances[1].cluster_id.is_none());
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/clusters/7"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Cluster not found"})))
            .mount(&server)
            .await;

        let err = backend_for(&server).get_cluster(None, "7").await.unwrap_err();
        assert_eq!(err.to_string(), "backend returned 404: Cluster not found");
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/clusters/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let err = backend_for(&server).list_clusters(None).await.unwrap_err();
        assert!(matches!(err, BackendError::Timeout));
    }

    #[tokio::test]
    async fn test_auto_cluster_server_error_is_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/instances/auto-cluster"))
            .and(body_json(json!({"description": "three web nodes"})))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "planner unavailable"})))
            .mount(&server)
            .await;

        let reply = backend_for(&server)
            .auto_cluster(None, "three web nodes")
            .await
            .unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.text, "planner unavailable");
    }

    #[tokio::test]
    async fn test_cluster_with_naive_timestamp_and_null_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/clusters/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 5,
                "name": null,
                "created_at": "2025-11-15T10:00:00.123456",
                "network_config": {"master_ip": "10.0.0.5"}
            })))
            .mount(&server)
            .await;

        let cluster = backend_for(&server).get_cluster(None, "5").await.unwrap();
        assert_eq!(cluster.id.as_str(), "5");
        assert_eq!(cluster.name, "");
        assert!(cluster.created_at.is_some());
        assert_eq!(cluster.network_config.unwrap()["master_ip"], "10.0.0.5");
    }

    #[tokio::test]
    async fn test_legacy_auth_paths() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 3, "username": "ana"})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(HttpBackendConfig {
            base_url: server.uri(),
            login_path: "/login".to_string(),
            me_path: "/users/me".to_string(),
            register_path: "/register".to_string(),
            ..Default::default()
        })
        .unwrap();
        let user = backend
            .register(&NewUser {
                username: "ana".to_string(),
                email: "ana@example.com".to_string(),
                full_name: "Ana".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.username, "ana");
    }

    #[tokio::test]
    async fn test_health_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        assert!(backend.health().await.is_ok());
        let err = backend.health().await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 503, .. }));
    }
}
