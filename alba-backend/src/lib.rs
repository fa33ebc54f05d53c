use alba_common::{Cluster, CreateClusterRequest, Instance, NewUser, User};
use async_trait::async_trait;

pub mod assistant;
pub mod error;
pub mod http;

#[cfg(feature = "mock")]
pub mod mock;

pub use assistant::AssistantReply;
pub use error::BackendError;
pub use http::{HttpBackend, HttpBackendConfig};

#[cfg(feature = "mock")]
pub use mock::MockBackend;

pub type Result<T> = std::result::Result<T, BackendError>;

/// Cluster-management API as seen by the console.
///
/// Calls that need a session take the bearer token as `Option<&str>`; the
/// listing endpoints are also served anonymously by some deployments.
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    /// Exchanges credentials for a bearer token.
    async fn login(&self, username: &str, password: &str) -> Result<String>;

    /// Resolves the user a token belongs to.
    async fn current_user(&self, token: &str) -> Result<User>;

    async fn register(&self, user: &NewUser) -> Result<User>;

    // Optional liveness check; the default assumes reachable.
    async fn health(&self) -> Result<()> {
        Ok(())
    }

    async fn list_clusters(&self, token: Option<&str>) -> Result<Vec<Cluster>>;

    /// Flat instance list, the single source for charts and drill-downs.
    async fn list_instances(&self, token: Option<&str>) -> Result<Vec<Instance>>;

    async fn get_cluster(&self, token: Option<&str>, id: &str) -> Result<Cluster>;

    async fn create_cluster(
        &self,
        token: Option<&str>,
        request: &CreateClusterRequest,
    ) -> Result<Cluster>;

    /// Asks the backend to reconcile instance states. The answer carries no data.
    async fn update_instance_status(&self, token: Option<&str>) -> Result<()>;

    /// Natural-language cluster provisioning.
    async fn auto_cluster(&self, token: Option<&str>, description: &str) -> Result<AssistantReply>;
}
