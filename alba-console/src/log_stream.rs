//! Best-effort capture of the provisioning log socket.
//!
//! Cluster creation never waits on this: the stream is followed in a
//! background task and failures only produce a warning.

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

pub const DEFAULT_CAPACITY: usize = 500;

/// Time limits for one followed stream.
#[derive(Debug, Clone, Copy)]
pub struct FollowLimits {
    /// Connect plus handshake.
    pub connect: Duration,
    /// Longest silence between two messages.
    pub idle: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    pub cluster: String,
    pub line: String,
    pub received_at: DateTime<Utc>,
}

/// Bounded ring of recent lines; the oldest line goes first.
pub struct LogBuffer {
    capacity: usize,
    lines: Mutex<VecDeque<LogLine>>,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lines: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, cluster: &str, line: impl Into<String>) {
        let mut lines = self.lines.lock().unwrap_or_else(|p| p.into_inner());
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(LogLine {
            cluster: cluster.to_string(),
            line: line.into(),
            received_at: Utc::now(),
        });
    }

    pub fn recent(&self, cluster: Option<&str>) -> Vec<LogLine> {
        let lines = self.lines.lock().unwrap_or_else(|p| p.into_inner());
        lines
            .iter()
            .filter(|l| cluster.map_or(true, |c| l.cluster == c))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn stream_url(template: &str, cluster: &str) -> String {
    template.replace("{cluster}", &urlencoding::encode(cluster))
}

/// Reads the socket until it closes or goes idle; returns the number of lines captured.
pub async fn follow(
    url: &str,
    cluster: &str,
    buffer: &LogBuffer,
    limits: FollowLimits,
) -> anyhow::Result<usize> {
    let (mut socket, _) = tokio::time::timeout(limits.connect, tokio_tungstenite::connect_async(url))
        .await
        .map_err(|_| anyhow::anyhow!("connecting to {} timed out after {:?}", url, limits.connect))?
        .with_context(|| format!("connecting to {}", url))?;
    tracing::debug!("following logs for {} at {}", cluster, url);

    let mut received = 0;
    loop {
        let message = match tokio::time::timeout(limits.idle, socket.next()).await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(_) => anyhow::bail!(
                "log stream silent for {:?} after {} lines",
                limits.idle,
                received
            ),
        };
        match message.context("log stream interrupted")? {
            Message::Text(text) => {
                for line in text.as_str().lines().filter(|l| !l.trim().is_empty()) {
                    buffer.push(cluster, line);
                    received += 1;
                }
            }
            Message::Binary(bytes) => {
                buffer.push(cluster, String::from_utf8_lossy(&bytes).into_owned());
                received += 1;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(received)
}

pub fn spawn_follow(
    buffer: Arc<LogBuffer>,
    template: &str,
    cluster: &str,
    limits: FollowLimits,
) -> tokio::task::JoinHandle<()> {
    let url = stream_url(template, cluster);
    let cluster = cluster.to_string();
    tokio::spawn(async move {
        match follow(&url, &cluster, &buffer, limits).await {
            Ok(lines) => tracing::info!("log stream for {} closed after {} lines", cluster, lines),
            Err(e) => tracing::warn!("log stream for {} unavailable: {:#}", cluster, e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::SinkExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_buffer_drops_oldest() {
        let buffer = LogBuffer::new(2);
        buffer.push("a", "one");
        buffer.push("b", "two");
        buffer.push("a", "three");

        let lines: Vec<String> = buffer.recent(None).into_iter().map(|l| l.line).collect();
        assert_eq!(lines, vec!["two", "three"]);
        assert_eq!(buffer.recent(Some("a")).len(), 1);
    }

    #[test]
    fn test_stream_url_substitutes_cluster() {
        assert_eq!(
            stream_url("ws://api:8000/ws/logs/{cluster}", "web front"),
            "ws://api:8000/ws/logs/web%20front"
        );
        assert_eq!(stream_url("ws://api:8000/ws/logs", "web"), "ws://api:8000/ws/logs");
    }

    fn short_limits() -> FollowLimits {
        FollowLimits {
            connect: Duration::from_millis(200),
            idle: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_unreachable_socket_is_an_error() {
        let buffer = LogBuffer::new(8);
        let result = follow("ws://127.0.0.1:9/ws/logs/x", "x", &buffer, short_limits()).await;
        assert!(result.is_err());
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_stalled_handshake_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(stream);
        });

        let buffer = LogBuffer::new(8);
        let url = format!("ws://{}/ws/logs/x", addr);
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            follow(&url, "x", &buffer, short_limits()),
        )
        .await
        .expect("follow kept waiting on the handshake");
        assert!(result.unwrap_err().to_string().contains("timed out"));
        server.abort();
    }

    #[tokio::test]
    async fn test_silent_stream_is_dropped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            socket.send(Message::text("pulling image\nstarting swarm".to_string())).await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let buffer = LogBuffer::new(8);
        let url = format!("ws://{}/ws/logs/lab", addr);
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            follow(&url, "lab", &buffer, short_limits()),
        )
        .await
        .expect("follow kept waiting on a silent stream");
        assert!(result.unwrap_err().to_string().contains("silent"));

        let lines: Vec<String> = buffer.recent(Some("lab")).into_iter().map(|l| l.line).collect();
        assert_eq!(lines, vec!["pulling image", "starting swarm"]);
        server.abort();
    }
}
