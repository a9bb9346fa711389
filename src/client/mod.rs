//! HTTP client for a running handsfree server.
//!
//! Used by the CLI subcommands and the dashboard.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{HandsfreeError, Result};
use crate::history::HistoryEntry;
use crate::recognition::RecognitionKind;
use crate::server::{
    CommandsResponse, ExecuteRequest, ExecuteResponse, HealthResponse, HistoryResponse, ToggleRequest,
};

/// Result of a toggle call, independent of which loop was toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleResult {
    pub changed: bool,
    pub enabled: bool,
}

/// Client for the handsfree HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    /// Decode a success body, or turn a non-2xx reply into `HandsfreeError::Server`.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await?;
            return parse_json(&body);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ExecuteResponse>(&body) {
            Ok(reply) => reply.message,
            Err(_) if body.is_empty() => status.canonical_reason().unwrap_or("request failed").to_string(),
            Err(_) => body,
        };
        Err(HandsfreeError::Server {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("/health").await
    }

    /// Enable or disable one recognition loop.
    pub async fn toggle(&self, kind: RecognitionKind, enabled: bool) -> Result<ToggleResult> {
        let body = ToggleRequest { enabled };
        match kind {
            RecognitionKind::Voice => {
                let reply: crate::server::VoiceToggleResponse = self.post("/toggle-voice", &body).await?;
                Ok(ToggleResult {
                    changed: reply.changed,
                    enabled: reply.voice_enabled,
                })
            }
            RecognitionKind::Visual => {
                let reply: crate::server::VisualToggleResponse = self.post("/toggle-visual", &body).await?;
                Ok(ToggleResult {
                    changed: reply.changed,
                    enabled: reply.visual_enabled,
                })
            }
        }
    }

    /// Run a command by name. Unknown commands come back as a 400 `Server` error.
    pub async fn execute(&self, command: &str) -> Result<ExecuteResponse> {
        let body = ExecuteRequest {
            command: command.to_string(),
        };
        self.post("/execute-command", &body).await
    }

    /// Most recent entries, oldest first. `None` uses the server's default limit.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        let path = match limit {
            Some(n) => format!("/command-history?limit={}", n),
            None => "/command-history".to_string(),
        };
        let reply: HistoryResponse = self.get(&path).await?;
        Ok(reply.history)
    }

    pub async fn commands(&self) -> Result<Vec<String>> {
        let reply: CommandsResponse = self.get("/available-commands").await?;
        Ok(reply.commands)
    }
}

/// Decode a reply body. Failures surface as `HandsfreeError::Json`.
fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}

/// Entries in `current` that come after `last`, for following history.
///
/// Compares append sequence numbers, since identical entries can repeat
/// within one timestamp second. When `last` is absent or has been evicted,
/// every entry is new. A sequence that went backwards means the server
/// restarted, so everything is new then too.
pub fn entries_after<'a>(last: Option<&HistoryEntry>, current: &'a [HistoryEntry]) -> &'a [HistoryEntry] {
    let Some(last) = last else {
        return current;
    };
    if current.last().is_some_and(|newest| newest.seq < last.seq) {
        return current;
    }
    let start = current.iter().position(|e| e.seq > last.seq).unwrap_or(current.len());
    &current[start..]
}
