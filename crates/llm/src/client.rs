//! Chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::LlmConfig;

/// HTTP timeout for one completion request. Generation calls are slow;
/// this bounds a hung connection, not a working model.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors from the language-model collaborator.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// `OPENAI_API_KEY` is unset.
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    /// The HTTP request could not be executed.
    #[error("Language model request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("Language model returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The completion came back with no content.
    #[error("No content in language model response")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Request(err.to_string())
    }
}

/// One completion request: a fixed system instruction plus a single user
/// turn.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Ask the model to emit strict JSON.
    pub json_mode: bool,
}

/// The language-model seam the pipeline depends on.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run one completion and return the raw text content.
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;

    /// Model identifier recorded for provenance on promoted structures.
    fn model_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// OpenAI-style implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completions implementation of [`ChatClient`].
pub struct OpenAiClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { http, config }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let mut body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
            // Some models reject max_tokens; the completions-token name
            // is accepted everywhere we target.
            "max_completion_tokens": request.max_tokens,
        });
        if request.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Language model request rejected");
            return Err(LlmError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
