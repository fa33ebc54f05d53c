// Client-side validation: nothing in here reaches the network, a form that
// fails to convert is never submitted.

use serde::{Deserialize, Serialize};

use crate::Provider;

/// Upper bound on instances per cluster.
pub const MAX_INSTANCES: u32 = 8;

const NGINX_COMPOSE: &str = r#"version: '3'
services:
  web:
    image: nginx:latest
    ports:
      - "80:80""#;

const DUMMY_COMPOSE: &str = r#"version: "3.9"
services:
  dummy-app-controller:
    image: rsprat/dummy-rest-app-controller:v1
    ports:
      - "30008:8000"
    environment:
      report_metrics_to_ems: "False"
    deploy:
      replicas: 1
      resources:
        limits:
          cpus: "1.0"
          memory: "1024M"
  dummy-app-worker:
    image: rsprat/dummy-rest-app-worker:v1
    environment:
      API_ADDRESS: "http://dummy-app-controller:8000"
    depends_on:
      - dummy-app-controller
    deploy:
      replicas: 1
      resources:
        limits:
          cpus: "1.0"
          memory: "1024M""#;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("cluster name is required")]
    EmptyName,
    #[error("a cluster needs at least one instance")]
    NoInstances,
    #[error("a cluster can have at most {max} instances (requested {requested})")]
    TooManyInstances { requested: u32, max: u32 },
    #[error("service port must be between 1 and 65535")]
    InvalidPort,
    #[error("a custom template needs a docker-compose definition")]
    EmptyCompose,
    #[error("username is required")]
    EmptyUsername,
    #[error("password is required")]
    EmptyPassword,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("describe the cluster you need")]
    EmptyDescription,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeTemplate {
    #[default]
    Nginx,
    Dummy,
    Custom,
}

impl ComposeTemplate {
    pub fn compose(&self) -> Option<&'static str> {
        match self {
            ComposeTemplate::Nginx => Some(NGINX_COMPOSE),
            ComposeTemplate::Dummy => Some(DUMMY_COMPOSE),
            ComposeTemplate::Custom => None,
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            ComposeTemplate::Dummy => 30008,
            ComposeTemplate::Nginx | ComposeTemplate::Custom => 80,
        }
    }
}

/// Wire payload of `POST /api/v1/clusters/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateClusterRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cluster_type: String,
    pub provider: Provider,
    pub n_instances: u32,
    pub instance_type: String,
    pub docker_compose: String,
    pub service_port: u16,
    #[serde(default)]
    pub network_config: serde_json::Map<String, serde_json::Value>,
}

impl CreateClusterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.n_instances == 0 {
            return Err(ValidationError::NoInstances);
        }
        if self.n_instances > MAX_INSTANCES {
            return Err(ValidationError::TooManyInstances {
                requested: self.n_instances,
                max: MAX_INSTANCES,
            });
        }
        if self.service_port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.docker_compose.trim().is_empty() {
            return Err(ValidationError::EmptyCompose);
        }
        Ok(())
    }
}

fn default_cluster_type() -> String {
    "docker-swarm".to_string()
}

fn default_provider() -> Provider {
    Provider::Aws
}

fn default_instances() -> u32 {
    1
}

fn default_instance_type() -> String {
    "micro".to_string()
}

/// Cluster creation form as submitted to the console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_cluster_type")]
    pub cluster_type: String,
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(default = "default_instances")]
    pub n_instances: u32,
    #[serde(default = "default_instance_type")]
    pub instance_type: String,
    #[serde(default)]
    pub template: ComposeTemplate,
    /// Required for the custom template, overrides the built-in ones otherwise.
    #[serde(default)]
    pub docker_compose: Option<String>,
    #[serde(default)]
    pub service_port: Option<u16>,
}

impl ClusterForm {
    pub fn into_request(self) -> Result<CreateClusterRequest, ValidationError> {
        let docker_compose = self
            .docker_compose
            .filter(|c| !c.trim().is_empty())
            .or_else(|| self.template.compose().map(str::to_string))
            .ok_or(ValidationError::EmptyCompose)?;

        let request = CreateClusterRequest {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            cluster_type: self.cluster_type,
            provider: self.provider,
            n_instances: self.n_instances,
            instance_type: self.instance_type,
            docker_compose,
            service_port: self.service_port.unwrap_or(self.template.default_port()),
            network_config: serde_json::Map::new(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Registration payload sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn into_new_user(self) -> Result<NewUser, ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if self.password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(NewUser {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            full_name: self.full_name.trim().to_string(),
            password: self.password,
        })
    }
}
