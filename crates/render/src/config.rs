//! Configuration for the render-provider client.

use crate::client::RenderError;

/// Default prediction API base.
pub const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";

/// Default model id for the ImageFX backend.
pub const DEFAULT_MODEL_IMAGEFX: &str = "google/imagen-4-ultra";

/// Default model id for the Recraft backend.
pub const DEFAULT_MODEL_RECRAFT: &str = "recraft-ai/recraft-v3";

/// Render-provider configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub api_base: String,
    pub api_token: String,
    pub model_imagefx: String,
    pub model_recraft: String,
}

impl RenderConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                  | Default                        |
    /// |--------------------------|--------------------------------|
    /// | `REPLICATE_API_BASE`     | `https://api.replicate.com/v1` |
    /// | `REPLICATE_API_TOKEN`    | (required)                     |
    /// | `REPLICATE_MODEL_IMAGEFX`| `google/imagen-4-ultra`        |
    /// | `REPLICATE_MODEL_RECRAFT`| `recraft-ai/recraft-v3`        |
    pub fn from_env() -> Result<Self, RenderError> {
        let api_token = std::env::var("REPLICATE_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(RenderError::MissingApiToken)?;

        Ok(Self {
            api_base: std::env::var("REPLICATE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.into()),
            api_token,
            model_imagefx: std::env::var("REPLICATE_MODEL_IMAGEFX")
                .unwrap_or_else(|_| DEFAULT_MODEL_IMAGEFX.into()),
            model_recraft: std::env::var("REPLICATE_MODEL_RECRAFT")
                .unwrap_or_else(|_| DEFAULT_MODEL_RECRAFT.into()),
        })
    }
}
