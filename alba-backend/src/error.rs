use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// 401 from the backend: the stored credential is no longer valid.
    #[error("authentication rejected")]
    Unauthorized,
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request timed out")]
    Timeout,
    #[error("could not reach backend: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Unauthorized)
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        BackendError::Status {
            status,
            message: message.into(),
        }
    }

    /// Builds a status error, preferring the `detail` or `message` field of a
    /// JSON error body.
    pub fn from_body(status: u16, body: &str, fallback: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("detail").or_else(|| v.get("message")).cloned())
            .map(|detail| match detail {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| fallback.to_string());
        BackendError::status(status, message)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}
