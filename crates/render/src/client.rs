//! Prediction-style render client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use atelier_core::renderer::RendererKind;

use crate::config::RenderConfig;

/// HTTP timeout for render requests. Submission uses `Prefer: wait`, so
/// a successful response may take the full render duration.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors from the render provider.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// `REPLICATE_API_TOKEN` is unset.
    #[error("REPLICATE_API_TOKEN is not set")]
    MissingApiToken,

    /// The HTTP request could not be executed.
    #[error("Render request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("Render provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
}

impl From<reqwest::Error> for RenderError {
    fn from(err: reqwest::Error) -> Self {
        RenderError::Request(err.to_string())
    }
}

/// Remote job status for a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

/// One render job as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    /// Output image URLs. The wire value may be a single string or an
    /// array; deserialization normalizes both to a list.
    #[serde(default, deserialize_with = "deserialize_output")]
    pub output: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub logs: Option<String>,
}

/// Accept `"url"`, `["url", ...]`, or null for the output field.
fn deserialize_output<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(url)) => vec![url],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    })
}

/// reqwest-backed render-provider client.
pub struct RenderClient {
    http: reqwest::Client,
    config: RenderConfig,
}

impl RenderClient {
    pub fn new(config: RenderConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { http, config }
    }

    /// Model id and input payload for a backend.
    fn model_input(&self, renderer: RendererKind, prompt: &str) -> (&str, Value) {
        match renderer {
            RendererKind::ImageFx => (
                self.config.model_imagefx.as_str(),
                json!({ "prompt": prompt, "aspect_ratio": "16:9" }),
            ),
            RendererKind::Recraft => (
                self.config.model_recraft.as_str(),
                json!({ "prompt": prompt, "size": "1365x1024", "style": "any" }),
            ),
        }
    }

    /// Submit a render job.
    ///
    /// Sends `Prefer: wait`, so the provider holds the response until
    /// the prediction completes when it can; callers still need to
    /// handle a `starting`/`processing` result and poll
    /// [`status`](Self::status).
    pub async fn generate(
        &self,
        renderer: RendererKind,
        prompt: &str,
    ) -> Result<Prediction, RenderError> {
        let (model_id, input) = self.model_input(renderer, prompt);

        tracing::info!(renderer = %renderer, model = model_id, "Submitting render job");

        let response = self
            .http
            .post(format!("{}/models/{model_id}/predictions", self.config.api_base))
            .bearer_auth(&self.config.api_token)
            .header("Prefer", "wait")
            .json(&json!({ "input": input }))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Fetch the current state of a prediction.
    pub async fn status(&self, prediction_id: &str) -> Result<Prediction, RenderError> {
        let response = self
            .http
            .get(format!("{}/predictions/{prediction_id}", self.config.api_base))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Request cancellation of a running prediction. Propagates the
    /// request; the remote job is not guaranteed to stop instantly.
    pub async fn cancel(&self, prediction_id: &str) -> Result<Prediction, RenderError> {
        let response = self
            .http
            .post(format!(
                "{}/predictions/{prediction_id}/cancel",
                self.config.api_base
            ))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Prediction, RenderError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Render provider request rejected");
            return Err(RenderError::Status {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<Prediction>()
            .await
            .map_err(|e| RenderError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mockito::Matcher;

    fn config(api_base: &str) -> RenderConfig {
        RenderConfig {
            api_base: api_base.to_string(),
            api_token: "r8-test".into(),
            model_imagefx: "google/imagen-4-ultra".into(),
            model_recraft: "recraft-ai/recraft-v3".into(),
        }
    }

    #[tokio::test]
    async fn generate_targets_the_renderer_model() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/recraft-ai/recraft-v3/predictions")
            .match_header("prefer", "wait")
            .match_body(Matcher::PartialJson(json!({
                "input": { "prompt": "[X]::5", "size": "1365x1024", "style": "any" }
            })))
            .with_body(
                json!({ "id": "pred1", "status": "succeeded", "output": "https://img/out.png" })
                    .to_string(),
            )
            .create_async()
            .await;

        let prediction = RenderClient::new(config(&server.url()))
            .generate(RendererKind::Recraft, "[X]::5")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(prediction.status, PredictionStatus::Succeeded);
        assert_eq!(prediction.output, vec!["https://img/out.png"]);
    }

    #[tokio::test]
    async fn imagefx_uses_aspect_ratio_input() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/google/imagen-4-ultra/predictions")
            .match_body(Matcher::PartialJson(json!({
                "input": { "prompt": "p", "aspect_ratio": "16:9" }
            })))
            .with_body(json!({ "id": "pred2", "status": "starting" }).to_string())
            .create_async()
            .await;

        let prediction = RenderClient::new(config(&server.url()))
            .generate(RendererKind::ImageFx, "p")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(prediction.status, PredictionStatus::Starting);
        assert!(prediction.output.is_empty());
    }

    #[tokio::test]
    async fn output_array_is_preserved() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predictions/pred3")
            .with_body(
                json!({
                    "id": "pred3",
                    "status": "succeeded",
                    "output": ["https://a.png", "https://b.png"]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let prediction = RenderClient::new(config(&server.url()))
            .status("pred3")
            .await
            .unwrap();
        assert_eq!(prediction.output.len(), 2);
    }

    #[tokio::test]
    async fn cancel_posts_to_the_cancel_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predictions/pred4/cancel")
            .with_body(json!({ "id": "pred4", "status": "canceled" }).to_string())
            .create_async()
            .await;

        let prediction = RenderClient::new(config(&server.url()))
            .cancel("pred4")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(prediction.status, PredictionStatus::Canceled);
    }

    #[tokio::test]
    async fn provider_error_status_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predictions/pred5")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = RenderClient::new(config(&server.url()))
            .status("pred5")
            .await
            .unwrap_err();
        assert_matches!(err, RenderError::Status { status: 500, .. });
    }
}
