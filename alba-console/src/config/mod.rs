// Console configuration, read from the environment (and `.env` via dotenv)
pub mod backend;

pub use backend::create_backend;

use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Http,
    Mock,
}

impl BackendKind {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "http" | "api" => Ok(BackendKind::Http),
            "mock" => Ok(BackendKind::Mock),
            other => anyhow::bail!("unknown ALBA_BACKEND '{}' (expected 'http' or 'mock')", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub bind_addr: SocketAddr,
    pub backend: BackendKind,
    /// Holds the persisted session token.
    pub state_dir: PathBuf,
    pub http_timeout: Duration,
    pub login_path: String,
    pub me_path: String,
    pub register_path: String,
    /// `{cluster}` is replaced with the cluster name.
    pub logs_ws_url: String,
    /// A log stream that stays silent this long is dropped.
    pub logs_idle_timeout: Duration,
    pub cors_permissive: bool,
    /// Upper bound for a single cluster lookup in the detail view.
    pub lookup_timeout: Duration,
}

pub fn api_url() -> String {
    std::env::var("ALBA_API_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "http://localhost:8000".to_string())
}

pub fn bind_addr() -> String {
    std::env::var("ALBA_BIND_ADDR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "0.0.0.0:8080".to_string())
}

pub fn backend_kind() -> String {
    std::env::var("ALBA_BACKEND")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "http".to_string())
}

pub fn state_dir() -> PathBuf {
    std::env::var("ALBA_STATE_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".alba"))
}

pub fn http_timeout_secs() -> u64 {
    std::env::var("ALBA_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(15)
}

pub fn login_path() -> String {
    std::env::var("ALBA_LOGIN_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "/api/v1/auth/login".to_string())
}

pub fn me_path() -> String {
    std::env::var("ALBA_ME_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "/api/v1/auth/me".to_string())
}

pub fn register_path() -> String {
    std::env::var("ALBA_REGISTER_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "/api/v1/auth/register".to_string())
}

pub fn logs_idle_secs() -> u64 {
    std::env::var("ALBA_LOGS_IDLE_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(120)
}

pub fn logs_ws_url(api_url: &str) -> String {
    std::env::var("ALBA_LOGS_WS_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_logs_ws_url(api_url))
}

pub fn cors_permissive() -> bool {
    std::env::var("ALBA_CORS_PERMISSIVE")
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// `http://host:8000` -> `ws://host:8000/ws/logs/{cluster}`
fn default_logs_ws_url(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/ws/logs/{{cluster}}", base)
}

impl ConsoleConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = api_url();
        let raw_addr = bind_addr();
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid ALBA_BIND_ADDR '{}'", raw_addr))?;
        let timeout = Duration::from_secs(http_timeout_secs());

        Ok(Self {
            logs_ws_url: logs_ws_url(&api_url),
            api_url,
            bind_addr,
            backend: BackendKind::parse(&backend_kind())?,
            state_dir: state_dir(),
            http_timeout: timeout,
            login_path: login_path(),
            me_path: me_path(),
            register_path: register_path(),
            logs_idle_timeout: Duration::from_secs(logs_idle_secs()),
            cors_permissive: cors_permissive(),
            lookup_timeout: timeout,
        })
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let api_url = "http://localhost:8000".to_string();
        Self {
            logs_ws_url: default_logs_ws_url(&api_url),
            api_url,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            backend: BackendKind::Mock,
            state_dir: PathBuf::from(".alba"),
            http_timeout: Duration::from_secs(15),
            login_path: "/api/v1/auth/login".to_string(),
            me_path: "/api/v1/auth/me".to_string(),
            register_path: "/api/v1/auth/register".to_string(),
            logs_idle_timeout: Duration::from_secs(120),
            cors_permissive: false,
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!(BackendKind::parse("Mock").unwrap(), BackendKind::Mock);
        assert_eq!(BackendKind::parse(" http ").unwrap(), BackendKind::Http);
        assert!(BackendKind::parse("grpc").is_err());
    }

    #[test]
    fn test_default_logs_url_follows_api_scheme() {
        assert_eq!(
            default_logs_ws_url("https://api.alba.dev/"),
            "wss://api.alba.dev/ws/logs/{cluster}"
        );
        assert_eq!(
            default_logs_ws_url("http://localhost:8000"),
            "ws://localhost:8000/ws/logs/{cluster}"
        );
    }
}
