use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

/// FastAPI reports handler failures as `{"detail": "..."}`
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Why a chat request did not produce a reply.
///
/// The chat view treats every variant the same way; the variants only exist
/// so the reason can be logged.
#[derive(Debug, Error)]
pub enum RequestFailed {
    #[error("request to assistant API failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("assistant API returned {status}{}", detail_suffix(.detail))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("malformed response from assistant API: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    base_url: String,
}

impl AssistantClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST one user message to `{base_url}/chat` and return the markdown reply.
    pub async fn chat(&self, message: &str) -> Result<String, RequestFailed> {
        let url = format!("{}/chat", self.base_url);
        tracing::debug!(%url, chars = message.chars().count(), "sending chat request");

        // .json() sets Content-Type: application/json
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = error_detail(&text);
            tracing::debug!(%status, ?detail, "assistant API rejected request");
            return Err(RequestFailed::Status { status, detail });
        }

        let body = response.bytes().await?;
        let parsed: ChatResponse = serde_json::from_slice(&body)
            .map_err(|e| RequestFailed::Malformed(e.to_string()))?;

        tracing::debug!(chars = parsed.response.chars().count(), "received reply");
        Ok(parsed.response)
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Pull a human-readable detail out of an error body, if there is one
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => Some(s),
        Ok(ErrorBody { detail }) => Some(detail.to_string()),
        Err(_) => Some(trimmed.chars().take(200).collect()),
    }
}
