use alba_backend::{AssistantReply, BackendError, ClusterBackend};
use alba_common::ValidationError;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::RwLock;

const GREETING: &str = "Describe the cluster you need and I will plan it for you.";

pub const DEFAULT_HISTORY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: uuid::Uuid,
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<serde_json::Value>,
}

impl ChatMessage {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            role,
            text: text.into(),
            cluster: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Conversation with the auto-cluster endpoint, starting with a greeting.
/// Only the most recent `capacity` messages are kept.
pub struct AssistantTranscript {
    capacity: usize,
    messages: RwLock<VecDeque<ChatMessage>>,
}

impl AssistantTranscript {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut messages = VecDeque::new();
        messages.push_back(ChatMessage::new(Role::Assistant, GREETING));
        Self {
            capacity: capacity.max(1),
            messages: RwLock::new(messages),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages
            .read()
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn push(&self, message: ChatMessage) {
        let mut messages = self.messages.write().unwrap_or_else(|p| p.into_inner());
        if messages.len() == self.capacity {
            messages.pop_front();
        }
        messages.push_back(message);
    }

    /// Server-side failures become assistant messages. Only an empty prompt
    /// or a rejected session is returned as an error.
    pub async fn ask(
        &self,
        backend: &dyn ClusterBackend,
        token: Option<&str>,
        description: &str,
    ) -> Result<ChatMessage, AskError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription.into());
        }
        self.push(ChatMessage::new(Role::User, description));

        let reply = match backend.auto_cluster(token, description).await {
            Ok(AssistantReply { text, cluster, .. }) => ChatMessage {
                cluster,
                ..ChatMessage::new(Role::Assistant, text)
            },
            Err(BackendError::Unauthorized) => return Err(BackendError::Unauthorized.into()),
            Err(e) => {
                tracing::warn!("auto-cluster request failed: {}", e);
                ChatMessage::new(
                    Role::Assistant,
                    format!("Could not reach the assistant service: {}", e),
                )
            }
        };
        self.push(reply.clone());
        Ok(reply)
    }
}

impl Default for AssistantTranscript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alba_backend::MockBackend;

    #[tokio::test]
    async fn test_ask_appends_both_sides() {
        let transcript = AssistantTranscript::new();
        let backend = MockBackend::seeded();

        let reply = transcript
            .ask(&backend, None, "three web servers")
            .await
            .unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert!(reply.text.contains("three web servers"));

        let roles: Vec<Role> = transcript.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_locally() {
        let transcript = AssistantTranscript::new();
        let err = transcript
            .ask(&MockBackend::seeded(), None, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AskError::Validation(ValidationError::EmptyDescription)));
        assert_eq!(transcript.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_history_keeps_latest_messages() {
        let transcript = AssistantTranscript::with_capacity(3);
        let backend = MockBackend::seeded();

        transcript.ask(&backend, None, "first").await.unwrap();
        transcript.ask(&backend, None, "second").await.unwrap();

        let messages = transcript.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::Assistant);
        assert!(messages[0].text.contains("first"));
        assert_eq!(messages[1].text, "second");
        assert!(messages[2].text.contains("second"));
    }
}
