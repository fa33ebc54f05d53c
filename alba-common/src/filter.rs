use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::{Cluster, ClusterKey, Instance, InstanceStatus, Provider};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("unknown detail mode '{0}'")]
    UnknownMode(String),
    #[error("detail mode '{0}' needs a status segment")]
    MissingStatus(DetailMode),
    #[error("detail key is empty")]
    EmptyKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetailMode {
    Provider,
    Status,
    Cluster,
    ClusterStatus,
}

impl DetailMode {
    pub fn parse(segment: &str) -> Result<Self, RouteError> {
        match segment {
            "provider" => Ok(DetailMode::Provider),
            "status" => Ok(DetailMode::Status),
            "cluster" => Ok(DetailMode::Cluster),
            "cluster-status" => Ok(DetailMode::ClusterStatus),
            other => Err(RouteError::UnknownMode(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailMode::Provider => "provider",
            DetailMode::Status => "status",
            DetailMode::Cluster => "cluster",
            DetailMode::ClusterStatus => "cluster-status",
        }
    }

    pub fn needs_status(&self) -> bool {
        matches!(self, DetailMode::Status | DetailMode::ClusterStatus)
    }
}

impl fmt::Display for DetailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drill-down selection taken from `/detail/{mode}/{key}[/{status}]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailFilter {
    pub mode: DetailMode,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InstanceStatus>,
}

impl DetailFilter {
    pub fn new(mode: DetailMode, key: &str, status: Option<&str>) -> Result<Self, RouteError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(RouteError::EmptyKey);
        }
        let status = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(InstanceStatus::parse);
        if mode.needs_status() && status.is_none() {
            return Err(RouteError::MissingStatus(mode));
        }
        Ok(Self {
            mode,
            key: key.to_string(),
            // Provider and cluster drill-downs ignore a trailing status segment.
            status: if mode.needs_status() { status } else { None },
        })
    }

    pub fn from_route(mode: &str, key: &str, status: Option<&str>) -> Result<Self, RouteError> {
        Self::new(DetailMode::parse(mode)?, key, status)
    }

    pub fn provider(provider: &Provider) -> Self {
        Self { mode: DetailMode::Provider, key: provider.as_str().to_string(), status: None }
    }

    pub fn provider_status(provider: &Provider, status: &InstanceStatus) -> Self {
        Self {
            mode: DetailMode::Status,
            key: provider.as_str().to_string(),
            status: Some(status.clone()),
        }
    }

    pub fn cluster(key: &ClusterKey) -> Self {
        Self { mode: DetailMode::Cluster, key: key.as_str().to_string(), status: None }
    }

    pub fn cluster_status(key: &ClusterKey, status: &InstanceStatus) -> Self {
        Self {
            mode: DetailMode::ClusterStatus,
            key: key.as_str().to_string(),
            status: Some(status.clone()),
        }
    }

    pub fn matches(&self, instance: &Instance) -> bool {
        match self.mode {
            DetailMode::Provider => self.provider_matches(instance),
            DetailMode::Status => self.provider_matches(instance) && self.status_matches(instance),
            DetailMode::Cluster => self.cluster_matches(instance),
            DetailMode::ClusterStatus => {
                self.cluster_matches(instance) && self.status_matches(instance)
            }
        }
    }

    pub fn apply(&self, instances: &[Instance]) -> Vec<Instance> {
        instances.iter().filter(|i| self.matches(i)).cloned().collect()
    }

    fn provider_matches(&self, instance: &Instance) -> bool {
        instance.provider.as_str().eq_ignore_ascii_case(&self.key)
    }

    fn status_matches(&self, instance: &Instance) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| instance.status.as_str().eq_ignore_ascii_case(s.as_str()))
    }

    fn cluster_matches(&self, instance: &Instance) -> bool {
        ClusterKey::of(instance) == ClusterKey::parse(&self.key)
    }

    pub fn title(&self) -> String {
        let status = self.status.as_ref().map(InstanceStatus::label).unwrap_or_default();
        let cluster = ClusterKey::parse(&self.key);
        match self.mode {
            DetailMode::Provider => format!("Instances on {}", self.key.to_uppercase()),
            DetailMode::Status => format!("{} instances on {}", status, self.key.to_uppercase()),
            DetailMode::Cluster => match cluster {
                ClusterKey::Unassigned => "Instances without cluster".to_string(),
                ClusterKey::Assigned(id) => format!("Instances in cluster {}", id),
            },
            DetailMode::ClusterStatus => match cluster {
                ClusterKey::Unassigned => format!("{} instances without cluster", status),
                ClusterKey::Assigned(id) => format!("{} instances in cluster {}", status, id),
            },
        }
    }

    /// Console route for this selection.
    pub fn href(&self) -> String {
        let mut href = format!("/detail/{}/{}", self.mode, urlencoding::encode(&self.key));
        if let Some(status) = &self.status {
            href.push('/');
            href.push_str(&urlencoding::encode(status.as_str()));
        }
        href
    }
}

/// Distinct real cluster ids of a filtered set, sentinel excluded.
pub fn distinct_cluster_keys(instances: &[Instance]) -> Vec<String> {
    instances
        .iter()
        .filter_map(|i| match ClusterKey::of(i) {
            ClusterKey::Assigned(id) => Some(id),
            ClusterKey::Unassigned => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Master address of a cluster as shown in the detail table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterLink {
    pub master_ip: Option<String>,
    pub service_url: String,
}

impl ClusterLink {
    pub fn from_cluster(cluster: &Cluster) -> Option<Self> {
        let network = cluster.network_config.as_ref();
        let master_ip = network
            .and_then(|n| string_field(n, &["master_ip", "masterIp"]))
            .or_else(|| cluster.master_ip.clone().filter(|ip| !ip.trim().is_empty()));
        let service_url = network.and_then(|n| string_field(n, &["service_url", "serviceUrl"]));

        let service_url = match (service_url, &master_ip) {
            (Some(url), _) => url,
            (None, Some(ip)) => format!("http://{}", ip),
            (None, None) => return None,
        };
        Some(Self { master_ip, service_url })
    }

    pub fn label(&self) -> &str {
        if let Some(ip) = &self.master_ip {
            return ip;
        }
        self.service_url
            .strip_prefix("http://")
            .or_else(|| self.service_url.strip_prefix("https://"))
            .unwrap_or(&self.service_url)
    }
}

fn string_field(value: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| value.get(name).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
