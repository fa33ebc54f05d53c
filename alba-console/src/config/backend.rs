use alba_backend::{ClusterBackend, HttpBackend, HttpBackendConfig};
use std::sync::Arc;

use super::{BackendKind, ConsoleConfig};

/// Builds the backend selected by `ALBA_BACKEND`.
pub fn create_backend(config: &ConsoleConfig) -> anyhow::Result<Arc<dyn ClusterBackend>> {
    match config.backend {
        BackendKind::Http => {
            let backend = HttpBackend::new(HttpBackendConfig {
                base_url: config.api_url.clone(),
                timeout: config.http_timeout,
                login_path: config.login_path.clone(),
                me_path: config.me_path.clone(),
                register_path: config.register_path.clone(),
            })?;
            tracing::info!("using cluster API at {}", config.api_url);
            Ok(Arc::new(backend))
        }
        BackendKind::Mock => mock_backend(),
    }
}

#[cfg(feature = "backend-mock")]
fn mock_backend() -> anyhow::Result<Arc<dyn ClusterBackend>> {
    tracing::warn!("using the in-memory demo backend");
    Ok(Arc::new(alba_backend::MockBackend::seeded()))
}

#[cfg(not(feature = "backend-mock"))]
fn mock_backend() -> anyhow::Result<Arc<dyn ClusterBackend>> {
    anyhow::bail!("ALBA_BACKEND=mock needs the `backend-mock` feature")
}
