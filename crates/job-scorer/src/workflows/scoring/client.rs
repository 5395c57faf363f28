use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::request::{PromptMessage, ScoringRequest};
use crate::config::{ConfigError, ModelConfig};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anything that can answer a scoring request with raw model text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<String, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("model API rejected credentials ({status}): {body}")]
    Auth { status: u16, body: String },
    #[error("model API quota or rate limit exceeded: {body}")]
    Quota { body: String },
    #[error("model API rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("model API server error ({status}): {body}")]
    Server { status: u16, body: String },
    #[error("model API request timed out")]
    Timeout,
    #[error("model API unreachable: {0}")]
    Network(String),
    #[error("model API returned an unreadable response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout
                | TransportError::Network(_)
                | TransportError::Server { .. }
                | TransportError::Decode(_)
        )
    }

    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => TransportError::Auth { status, body },
            429 => TransportError::Quota { body },
            500..=599 => TransportError::Server { status, body },
            _ => TransportError::Rejected { status, body },
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_decode() || err.is_body() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [PromptMessage],
}

impl AnthropicClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn score(&self, request: &ScoringRequest) -> Result<String, TransportError> {
        let body = MessagesBody {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: &request.messages,
        };

        debug!(model = %self.model, messages = request.messages.len(), "calling model API");
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(status.as_u16(), body));
        }

        let payload: Value = response.json().await?;
        extract_text(&payload)
    }
}

/// Concatenates the text blocks of a Messages API response.
fn extract_text(payload: &Value) -> Result<String, TransportError> {
    let blocks = payload["content"]
        .as_array()
        .ok_or_else(|| TransportError::Decode("missing content array".to_string()))?;

    let text = blocks
        .iter()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(TransportError::Decode(
            "response contained no text blocks".to_string(),
        ));
    }
    Ok(text)
}
