//! Process-wide operator session.
//!
//! The console holds a single session: one bearer token obtained from the
//! cluster API, persisted through a [`TokenStore`] so a restart can pick it
//! up again. Only `login`, `logout` and `invalidate` change who is signed in.

use alba_backend::{BackendError, ClusterBackend};
use alba_common::{RegisterForm, User, ValidationError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// File name of the persisted credential.
pub const TOKEN_KEY: &str = "token";

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> anyhow::Result<()>;
    fn clear(&self);
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn save(&self, token: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("could not remove {}: {}", self.path.display(), e);
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) -> anyhow::Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token store poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = None;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

const SESSION_EXPIRED: &str = "Your session has expired, please sign in again";

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

struct SessionState {
    user: Option<User>,
    token: Option<String>,
    loading: bool,
    error: Option<String>,
}

pub struct SessionContext {
    backend: Arc<dyn ClusterBackend>,
    store: Arc<dyn TokenStore>,
    state: RwLock<SessionState>,
}

impl SessionContext {
    pub fn new(backend: Arc<dyn ClusterBackend>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            backend,
            store,
            state: RwLock::new(SessionState {
                user: None,
                token: None,
                loading: true,
                error: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Revalidates a persisted token. A token the backend does not accept is
    /// dropped from the store.
    pub async fn restore(&self) {
        let Some(token) = self.store.load() else {
            self.write().loading = false;
            return;
        };

        match self.backend.current_user(&token).await {
            Ok(user) => {
                tracing::info!("restored session for {}", user.username);
                let mut state = self.write();
                state.user = Some(user);
                state.token = Some(token);
                state.loading = false;
            }
            Err(e) => {
                tracing::info!("stored session discarded: {}", e);
                self.store.clear();
                let mut state = self.write();
                state.user = None;
                state.token = None;
                state.loading = false;
            }
        }
    }

    /// On failure the previous session stays as it was and the message is
    /// kept in `last_error`.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, SessionError> {
        self.clear_error();
        match self.exchange(username.trim(), password).await {
            Ok((token, user)) => {
                if let Err(e) = self.store.save(&token) {
                    tracing::warn!("session token not persisted: {}", e);
                }
                tracing::info!("signed in as {}", user.username);
                let mut state = self.write();
                state.user = Some(user.clone());
                state.token = Some(token);
                state.loading = false;
                Ok(user)
            }
            Err(e) => {
                tracing::debug!("login failed: {}", e);
                self.write().error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn exchange(&self, username: &str, password: &str) -> Result<(String, User), SessionError> {
        if username.is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }
        let token = self.backend.login(username, password).await.map_err(rejected)?;
        let user = self.backend.current_user(&token).await.map_err(rejected)?;
        Ok((token, user))
    }

    pub async fn register(&self, form: RegisterForm) -> Result<User, SessionError> {
        let user = form.into_new_user()?;
        let registered = self.backend.register(&user).await?;
        tracing::info!("registered user {}", registered.username);
        Ok(registered)
    }

    pub fn logout(&self) {
        self.store.clear();
        let mut state = self.write();
        state.user = None;
        state.token = None;
        state.error = None;
        state.loading = false;
    }

    /// Drops the session after the backend rejected its token.
    pub fn invalidate(&self) {
        self.store.clear();
        let mut state = self.write();
        if state.token.is_some() {
            tracing::info!("session rejected by backend, signing out");
        }
        state.user = None;
        state.token = None;
        state.error = Some(SESSION_EXPIRED.to_string());
        state.loading = false;
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        let state = self.read();
        state.user.is_some() && state.token.is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn clear_error(&self) {
        self.write().error = None;
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.read();
        SessionSnapshot {
            user: state.user.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }
}

fn rejected(e: BackendError) -> SessionError {
    if e.is_unauthorized() {
        SessionError::InvalidCredentials
    } else {
        SessionError::Backend(e)
    }
}
