use alba_backend::ClusterBackend;
use std::sync::Arc;

use crate::assistant::AssistantTranscript;
use crate::config::ConsoleConfig;
use crate::detail_view::DetailView;
use crate::log_stream::{LogBuffer, DEFAULT_CAPACITY};
use crate::session::{SessionContext, TokenStore};

pub struct AppState {
    pub backend: Arc<dyn ClusterBackend>,
    pub session: SessionContext,
    pub detail: DetailView,
    pub logs: Arc<LogBuffer>,
    pub assistant: AssistantTranscript,
    pub config: ConsoleConfig,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn ClusterBackend>,
        store: Arc<dyn TokenStore>,
        config: ConsoleConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            session: SessionContext::new(backend.clone(), store),
            detail: DetailView::new(backend.clone(), config.lookup_timeout),
            logs: Arc::new(LogBuffer::new(DEFAULT_CAPACITY)),
            assistant: AssistantTranscript::new(),
            backend,
            config,
        })
    }

    /// Bearer token of the current session, if any.
    pub fn token(&self) -> Option<String> {
        self.session.token()
    }
}
