//! Configuration for the language-model client.

use crate::client::LlmError;

/// Default chat-completions endpoint base.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default sampling temperature. Deliberately high: batch generation
/// wants variety, so output is non-deterministic by design.
pub const DEFAULT_TEMPERATURE: f64 = 0.9;

/// Default output token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 3000;

/// Language-model client configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var               | Default                     |
    /// |-----------------------|-----------------------------|
    /// | `OPENAI_API_BASE`     | `https://api.openai.com/v1` |
    /// | `OPENAI_API_KEY`      | (required)                  |
    /// | `OPENAI_MODEL`        | `gpt-4o`                    |
    /// | `OPENAI_TEMPERATURE`  | `0.9`                       |
    /// | `OPENAI_MAX_TOKENS`   | `3000`                      |
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let temperature = std::env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        let max_tokens = std::env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        Ok(Self {
            api_base: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.into()),
            api_key,
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            temperature,
            max_tokens,
        })
    }
}
