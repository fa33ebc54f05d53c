use alba_common::{
    Cluster, CreateClusterRequest, Instance, InstanceStatus, NewUser, Provider, RecordId, User,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::{AssistantReply, BackendError, ClusterBackend, Result};

/// In-memory stand-in for the cluster API, used for demos and tests.
///
/// Any non-empty credentials log in; the resolved user carries the login
/// name. Created clusters start with `pending` instances that the next
/// status refresh flips to `running`.
pub struct MockBackend {
    state: Mutex<MockState>,
    latency: Duration,
}

#[derive(Default)]
struct MockState {
    clusters: Vec<Cluster>,
    unassigned: Vec<Instance>,
    sessions: HashMap<String, User>,
    users: Vec<User>,
    failing_lookups: HashSet<String>,
    next_cluster_id: i64,
    next_instance_id: i64,
}

impl MockBackend {
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_cluster_id: 1,
                next_instance_id: 1,
                ..Default::default()
            }),
            latency: Duration::ZERO,
        }
    }

    /// Two clusters plus one unassigned instance.
    pub fn seeded() -> Self {
        let backend = Self::empty();
        {
            let mut state = backend.lock();
            let web = state.push_cluster(
                "web-frontend",
                "docker-swarm",
                json!({"master_ip": "3.120.10.4"}),
                &[
                    (Provider::Aws, InstanceStatus::Running, "eu-west-1"),
                    (Provider::Aws, InstanceStatus::Running, "eu-west-1"),
                    (Provider::Aws, InstanceStatus::Stopped, "eu-west-1"),
                ],
            );
            let batch = state.push_cluster(
                "batch-workers",
                "docker-swarm",
                json!({"service_url": "http://batch.alba.local:30008"}),
                &[
                    (Provider::Gcp, InstanceStatus::Running, "europe-west1"),
                    (Provider::Gcp, InstanceStatus::Pending, "europe-west1"),
                ],
            );
            tracing::debug!("mock backend seeded clusters {} and {}", web, batch);
            let id = state.take_instance_id();
            let mut spare = Instance::new(id, Provider::Gcp, InstanceStatus::Error).named("spare-1");
            spare.region = Some("europe-west1".to_string());
            state.unassigned.push(spare);
        }
        backend
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes `get_cluster` fail for this id.
    pub fn fail_cluster_lookup(&self, id: &str) {
        self.lock().failing_lookups.insert(id.to_string());
    }

    pub fn add_unassigned(&self, instance: Instance) {
        self.lock().unassigned.push(instance);
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn require_session(&self, token: &str) -> Result<User> {
        self.lock()
            .sessions
            .get(token)
            .cloned()
            .ok_or(BackendError::Unauthorized)
    }
}

impl MockState {
    fn take_instance_id(&mut self) -> i64 {
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        id
    }

    fn push_cluster(
        &mut self,
        name: &str,
        cluster_type: &str,
        network_config: serde_json::Value,
        members: &[(Provider, InstanceStatus, &str)],
    ) -> RecordId {
        let id = RecordId::from(self.next_cluster_id);
        self.next_cluster_id += 1;

        let instances = members
            .iter()
            .enumerate()
            .map(|(index, (provider, status, region))| {
                let instance_id = self.take_instance_id();
                let mut instance = Instance::new(instance_id, provider.clone(), status.clone())
                    .named(format!("{}-{}", name, index + 1))
                    .in_cluster(id.clone());
                instance.cluster_name = Some(name.to_string());
                instance.region = Some(region.to_string());
                instance.cpu_cores = Some(2);
                instance.memory_gb = Some(4.0);
                instance.internal_ip = Some(format!("10.0.{}.{}", self.next_cluster_id, index + 10));
                instance
            })
            .collect();

        self.clusters.push(Cluster {
            id: id.clone(),
            name: name.to_string(),
            description: None,
            status: Some("active".to_string()),
            cluster_type: Some(cluster_type.to_string()),
            instances,
            network_config: Some(network_config),
            master_ip: None,
            created_at: Some(chrono::Utc::now()),
        });
        id
    }
}

fn region_for(provider: &Provider) -> &'static str {
    match provider {
        Provider::Gcp => "europe-west1",
        _ => "eu-west-1",
    }
}

#[async_trait]
impl ClusterBackend for MockBackend {
    async fn login(&self, username: &str, password: &str) -> Result<String> {
        self.delay().await;
        if username.trim().is_empty() || password.is_empty() {
            return Err(BackendError::Unauthorized);
        }
        let token = format!("mock-token-{}", uuid::Uuid::new_v4().simple());
        let mut state = self.lock();
        let user = state
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .unwrap_or_else(|| User {
                id: Some(RecordId::from(1)),
                username: username.to_string(),
                email: Some(format!("{}@alba.local", username)),
                full_name: None,
                role: Some("user".to_string()),
                avatar: None,
            });
        state.sessions.insert(token.clone(), user);
        tracing::debug!("mock login for {}", username);
        Ok(token)
    }

    async fn current_user(&self, token: &str) -> Result<User> {
        self.delay().await;
        self.require_session(token)
    }

    async fn register(&self, user: &NewUser) -> Result<User> {
        self.delay().await;
        let mut state = self.lock();
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(BackendError::status(400, "username already registered"));
        }
        let registered = User {
            id: Some(RecordId::from(state.users.len() as i64 + 2)),
            username: user.username.clone(),
            email: Some(user.email.clone()).filter(|e| !e.is_empty()),
            full_name: Some(user.full_name.clone()).filter(|n| !n.is_empty()),
            role: Some("user".to_string()),
            avatar: None,
        };
        state.users.push(registered.clone());
        Ok(registered)
    }

    async fn list_clusters(&self, _token: Option<&str>) -> Result<Vec<Cluster>> {
        self.delay().await;
        Ok(self.lock().clusters.clone())
    }

    async fn list_instances(&self, _token: Option<&str>) -> Result<Vec<Instance>> {
        self.delay().await;
        let state = self.lock();
        let mut instances = Cluster::flatten_instances(state.clusters.clone());
        instances.extend(state.unassigned.iter().cloned());
        Ok(instances)
    }

    async fn get_cluster(&self, _token: Option<&str>, id: &str) -> Result<Cluster> {
        self.delay().await;
        let state = self.lock();
        if state.failing_lookups.contains(id) {
            return Err(BackendError::status(500, "cluster lookup failed"));
        }
        state
            .clusters
            .iter()
            .find(|c| c.id.as_str() == id)
            .cloned()
            .ok_or_else(|| BackendError::status(404, "Cluster not found"))
    }

    async fn create_cluster(
        &self,
        _token: Option<&str>,
        request: &CreateClusterRequest,
    ) -> Result<Cluster> {
        self.delay().await;
        request
            .validate()
            .map_err(|e| BackendError::status(422, e.to_string()))?;

        let mut state = self.lock();
        let members: Vec<(Provider, InstanceStatus, &str)> = (0..request.n_instances)
            .map(|_| {
                (
                    request.provider.clone(),
                    InstanceStatus::Pending,
                    region_for(&request.provider),
                )
            })
            .collect();
        let master = format!("10.20.{}.1", state.next_cluster_id);
        let id = state.push_cluster(
            &request.name,
            &request.cluster_type,
            json!({
                "master_ip": master,
                "service_url": format!("http://{}:{}", master, request.service_port),
            }),
            &members,
        );
        let cluster = state
            .clusters
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| BackendError::status(500, "cluster vanished"))?;
        cluster.description = Some(request.description.clone()).filter(|d| !d.is_empty());
        cluster.status = Some("creating".to_string());
        tracing::info!("mock cluster {} created with {} instances", id, request.n_instances);
        Ok(cluster.clone())
    }

    async fn update_instance_status(&self, _token: Option<&str>) -> Result<()> {
        self.delay().await;
        let mut state = self.lock();
        for cluster in state.clusters.iter_mut() {
            for instance in cluster.instances.iter_mut() {
                if instance.status == InstanceStatus::Pending {
                    instance.status = InstanceStatus::Running;
                }
            }
            if cluster.status.as_deref() == Some("creating") {
                cluster.status = Some("active".to_string());
            }
        }
        Ok(())
    }

    async fn auto_cluster(&self, _token: Option<&str>, description: &str) -> Result<AssistantReply> {
        self.delay().await;
        let description = description.trim();
        if description.is_empty() {
            return Err(BackendError::status(422, "description is required"));
        }
        let body = json!({
            "message": format!(
                "Plan for \"{}\": 3 x micro instances on AWS running Docker Swarm. \
                 Use the manual form to adjust and create it.",
                description
            ),
        });
        Ok(AssistantReply::interpret(200, "application/json", &body.to_string()))
    }
}
