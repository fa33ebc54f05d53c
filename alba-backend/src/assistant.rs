use serde::Serialize;
use serde_json::Value;

/// Answer of the auto-cluster endpoint, reduced to something a chat
/// transcript can show. Server errors become text too; only transport and
/// authentication failures are reported as errors by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantReply {
    pub ok: bool,
    pub status: u16,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<Value>,
}

impl AssistantReply {
    pub fn interpret(status: u16, content_type: &str, body: &str) -> Self {
        let ok = (200..300).contains(&status);

        if !content_type.contains("application/json") {
            let prefix = if ok {
                "Server response:".to_string()
            } else {
                format!("Server error ({}):", status)
            };
            return Self {
                ok,
                status,
                text: format!("{}\n{}", prefix, body),
                cluster: None,
            };
        }

        let data: Value = match serde_json::from_str(body) {
            Ok(data) => data,
            Err(_) => {
                return Self {
                    ok: false,
                    status,
                    text: format!("The server answered but the body is not valid JSON:\n{}", body),
                    cluster: None,
                }
            }
        };

        let message = data.get("message").and_then(Value::as_str).map(str::to_string);
        let text = if !ok {
            message.unwrap_or_else(|| format!("Server error ({}): {}", status, data))
        } else if let Value::String(s) = &data {
            s.clone()
        } else if let Some(message) = message {
            message
        } else {
            serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string())
        };

        Self {
            ok,
            status,
            text,
            cluster: data.get("cluster").filter(|c| c.is_object()).cloned(),
        }
    }
}
