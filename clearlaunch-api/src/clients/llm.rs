/// LLM completion client
///
/// Talks to any OpenAI-compatible `/chat/completions` endpoint. Calls carry
/// no timeout or retry beyond the HTTP client's defaults.

use crate::config::LlmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// LLM call error
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM provider is not configured")]
    NotConfigured,

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("LLM provider returned an empty completion")]
    EmptyResponse,
}

/// Expected shape of the completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Provider is asked for a JSON object
    Json,
    Text,
}

/// Text completion provider
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Completes a single-turn prompt
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// OpenAI-compatible chat-completions client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn request_body<'a>(&'a self, prompt: &'a str, format: ResponseFormat) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: match format {
                ResponseFormat::Json => Some(ResponseFormatBody { kind: "json_object" }),
                ResponseFormat::Text => None,
            },
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String, LlmError> {
        let api_key = self.config.api_key.as_deref().ok_or(LlmError::NotConfigured)?;
        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.request_body(prompt, format))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "LLM request failed");
                LlmError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(status = %status, message = %message, "LLM provider error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        debug!(completion_len = content.len(), "LLM completion received");
        Ok(content)
    }
}
