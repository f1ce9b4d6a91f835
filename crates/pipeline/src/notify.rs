//! Batch-completion notification.
//!
//! Delivery is best-effort with a single attempt. A failed notification
//! is logged and never fails the batch run that triggered it.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use atelier_core::skeleton::{excerpt, NOTIFICATION_EXCERPT_LEN};

use crate::generator::GeneratedIdea;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Completion-notification seam. The orchestrator only knows delivery
/// succeeded or failed; transport is the implementation's concern.
#[async_trait]
pub trait BatchNotifier: Send + Sync {
    async fn batch_complete(
        &self,
        recipients: &[String],
        ideas: &[GeneratedIdea],
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Notification endpoint returned {0}")]
    Status(u16),
}

#[derive(Serialize)]
struct NotifyPayload<'a> {
    recipients: &'a [String],
    subject: String,
    ideas: Vec<IdeaSummary>,
}

#[derive(Serialize)]
struct IdeaSummary {
    skeleton: String,
    renderer: String,
    #[serde(rename = "rewardEstimate")]
    reward_estimate: f64,
}

/// Posts a JSON completion summary to a configured webhook URL.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }

    /// Webhook URL from `NOTIFY_WEBHOOK_URL`, if configured.
    pub fn from_env() -> Option<Self> {
        std::env::var("NOTIFY_WEBHOOK_URL").ok().map(Self::new)
    }
}

#[async_trait]
impl BatchNotifier for WebhookNotifier {
    async fn batch_complete(
        &self,
        recipients: &[String],
        ideas: &[GeneratedIdea],
    ) -> Result<(), NotifyError> {
        let payload = NotifyPayload {
            recipients,
            subject: format!("Daily batch complete: {} new prompt ideas", ideas.len()),
            ideas: ideas
                .iter()
                .map(|idea| IdeaSummary {
                    skeleton: excerpt(&idea.skeleton, NOTIFICATION_EXCERPT_LEN),
                    renderer: idea.renderer.clone(),
                    reward_estimate: idea.reward_estimate,
                })
                .collect(),
        };

        let response = self
            .http
            .post(&self.url)
            .timeout(NOTIFY_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        tracing::info!(recipients = recipients.len(), "Batch notification delivered");
        Ok(())
    }
}
