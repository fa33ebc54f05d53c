use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

pub mod aggregate;
pub mod filter;
pub mod forms;
pub mod palette;

pub use aggregate::{
    aggregate_by_cluster, aggregate_by_cluster_status, aggregate_by_provider,
    aggregate_by_provider_status, InstanceCharts,
};
pub use filter::{ClusterLink, DetailFilter, DetailMode, RouteError};
pub use forms::{
    ClusterForm, ComposeTemplate, CreateClusterRequest, NewUser, RegisterForm, ValidationError,
    MAX_INSTANCES,
};

/// Reserved cluster key for instances without a cluster assignment.
pub const NO_CLUSTER_KEY: &str = "no-cluster";

// --- Enums ---

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    Aws,
    Gcp,
    /// Anything the dashboard does not chart, kept verbatim.
    Other(String),
}

impl Provider {
    /// Charted providers, in display order.
    pub const ALL: [Provider; 2] = [Provider::Aws, Provider::Gcp];

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "aws" => Provider::Aws,
            "gcp" => Provider::Gcp,
            _ => Provider::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Provider::Aws => "aws",
            Provider::Gcp => "gcp",
            Provider::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Provider::Other(_))
    }
}

impl Default for Provider {
    fn default() -> Self {
        Provider::Other(String::new())
    }
}

impl From<String> for Provider {
    fn from(raw: String) -> Self {
        Provider::parse(&raw)
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        provider.as_str().to_string()
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceStatus {
    Pending,
    Running,
    Stopped,
    Terminated,
    Error,
    Other(String),
}

impl InstanceStatus {
    /// Known lifecycle states, in display order.
    pub const ALL: [InstanceStatus; 5] = [
        InstanceStatus::Pending,
        InstanceStatus::Running,
        InstanceStatus::Stopped,
        InstanceStatus::Terminated,
        InstanceStatus::Error,
    ];

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "pending" => InstanceStatus::Pending,
            "running" => InstanceStatus::Running,
            "stopped" => InstanceStatus::Stopped,
            "terminated" => InstanceStatus::Terminated,
            "error" => InstanceStatus::Error,
            _ => InstanceStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InstanceStatus::Pending => "pending",
            InstanceStatus::Running => "running",
            InstanceStatus::Stopped => "stopped",
            InstanceStatus::Terminated => "terminated",
            InstanceStatus::Error => "error",
            InstanceStatus::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, InstanceStatus::Other(_))
    }

    /// "running" -> "Running"
    pub fn label(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "Unknown".to_string(),
        }
    }
}

impl Default for InstanceStatus {
    fn default() -> Self {
        InstanceStatus::Other(String::new())
    }
}

impl From<String> for InstanceStatus {
    fn from(raw: String) -> Self {
        InstanceStatus::parse(&raw)
    }
}

impl From<InstanceStatus> for String {
    fn from(status: InstanceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Identifiers ---

/// Backend record id. The API hands out integers for some records and
/// strings for others; both are kept in their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(raw: impl Into<String>) -> Self {
        RecordId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId(id.to_string())
    }
}

impl From<i32> for RecordId {
    fn from(id: i32) -> Self {
        RecordId(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId(id.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(id) => RecordId(id.to_string()),
            Raw::Float(id) => RecordId(id.to_string()),
            Raw::Str(id) => RecordId(id),
        })
    }
}

/// Grouping key for the cluster charts and the cluster drill-down.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClusterKey {
    Assigned(String),
    Unassigned,
}

impl ClusterKey {
    /// Total over every instance: a missing or blank `cluster_id` is the sentinel.
    pub fn of(instance: &Instance) -> Self {
        match &instance.cluster_id {
            Some(id) if !id.is_blank() => ClusterKey::Assigned(id.as_str().to_string()),
            _ => ClusterKey::Unassigned,
        }
    }

    /// Parses a route segment back into a key.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == NO_CLUSTER_KEY {
            ClusterKey::Unassigned
        } else {
            ClusterKey::Assigned(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ClusterKey::Assigned(id) => id,
            ClusterKey::Unassigned => NO_CLUSTER_KEY,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, ClusterKey::Assigned(_))
    }

    pub fn label(&self) -> String {
        match self {
            ClusterKey::Assigned(id) => id.clone(),
            ClusterKey::Unassigned => "No cluster".to_string(),
        }
    }
}

impl Ord for ClusterKey {
    // Integer ids first (numerically), then other ids, sentinel last.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ClusterKey::Unassigned, ClusterKey::Unassigned) => Ordering::Equal,
            (ClusterKey::Unassigned, _) => Ordering::Greater,
            (_, ClusterKey::Unassigned) => Ordering::Less,
            (ClusterKey::Assigned(a), ClusterKey::Assigned(b)) => {
                match (a.parse::<u64>(), b.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => a.cmp(b),
                }
            }
        }
    }
}

impl PartialOrd for ClusterKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ClusterKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// --- Entities ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider: Provider,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: InstanceStatus,
    #[serde(default, alias = "clusterId")]
    pub cluster_id: Option<RecordId>,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub cpu_cores: Option<u32>,
    #[serde(default)]
    pub memory_gb: Option<f64>,
    #[serde(default)]
    pub external_ip: Option<String>,
    #[serde(default)]
    pub internal_ip: Option<String>,
}

impl Instance {
    pub fn new(id: impl Into<RecordId>, provider: Provider, status: InstanceStatus) -> Self {
        Self {
            id: id.into(),
            name: None,
            provider,
            status,
            cluster_id: None,
            cluster_name: None,
            region: None,
            cpu_cores: None,
            memory_gb: None,
            external_ip: None,
            internal_ip: None,
        }
    }

    pub fn in_cluster(mut self, cluster_id: impl Into<RecordId>) -> Self {
        self.cluster_id = Some(cluster_id.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn cluster_key(&self) -> ClusterKey {
        ClusterKey::of(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cluster_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instances: Vec<Instance>,
    /// Free-form network settings; the master address lives here when known.
    #[serde(default)]
    pub network_config: Option<serde_json::Value>,
    #[serde(default, alias = "masterIp")]
    pub master_ip: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Cluster {
    /// Flattens nested cluster payloads, stamping each instance with its owner.
    pub fn flatten_instances(clusters: Vec<Cluster>) -> Vec<Instance> {
        clusters
            .into_iter()
            .flat_map(|cluster| {
                let id = cluster.id;
                let name = cluster.name;
                cluster.instances.into_iter().map(move |mut instance| {
                    instance.cluster_id = Some(id.clone());
                    instance.cluster_name = Some(name.clone());
                    instance
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 and zone-less timestamps (read as UTC); anything else is dropped.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(raw)) => raw,
        _ => return Ok(None),
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc()))
}
