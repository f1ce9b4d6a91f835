//! The daily batch orchestrator.
//!
//! One run: check the settings gate, select candidates, generate drafts,
//! persist up to `batch_size` of them as Proposed ideas, and mark the
//! settings record complete only when every planned idea was created.
//! Idea creations are independent; one failed write never aborts the
//! rest of the run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use atelier_core::idea::{NewIdea, PROPOSED_BY_AI};
use atelier_core::settings::SettingsPatch;
use atelier_store::{RecordStore, StoreError};

use crate::generator::{GeneratedIdea, GenerationError, IdeaGenerator};
use crate::notify::BatchNotifier;
use crate::selector::{select_candidates, SelectError, SelectorConfig};

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The settings gate is off; nothing was selected or generated.
    #[error("Batch generation is disabled in settings")]
    Disabled,

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Every validated draft the generator produced, including any that
    /// fell outside the batch size or failed to persist.
    pub ideas: Vec<GeneratedIdea>,
    /// Number of drafts the run attempted to persist.
    pub planned: usize,
    /// Number of idea records actually created.
    pub created: usize,
    /// True when every planned idea was created and the settings record
    /// was marked complete.
    #[serde(rename = "batchComplete")]
    pub batch_complete: bool,
    pub timestamp: DateTime<Utc>,
}

/// Runs the selection, generation, and persistence sequence.
pub struct BatchRunner {
    store: Arc<dyn RecordStore>,
    generator: IdeaGenerator,
    notifier: Option<Arc<dyn BatchNotifier>>,
    selector: SelectorConfig,
}

impl BatchRunner {
    pub fn new(
        store: Arc<dyn RecordStore>,
        generator: IdeaGenerator,
        notifier: Option<Arc<dyn BatchNotifier>>,
        selector: SelectorConfig,
    ) -> Self {
        Self {
            store,
            generator,
            notifier,
            selector,
        }
    }

    /// Execute one batch run.
    pub async fn run(&self) -> Result<BatchReport, BatchError> {
        let settings = self.store.fetch_settings().await?;
        if !settings.batch_enabled {
            tracing::info!("Batch run skipped: disabled in settings");
            return Err(BatchError::Disabled);
        }

        let candidates = select_candidates(self.store.as_ref(), &self.selector).await?;
        tracing::info!(
            top = candidates.top.len(),
            underexplored = candidates.underexplored.len(),
            "Selected generation candidates"
        );

        let generated = self
            .generator
            .generate(&candidates.top, &candidates.underexplored)
            .await?;

        let batch_size = settings.batch_size as usize;
        let planned = &generated.ideas[..generated.ideas.len().min(batch_size)];

        let mut created = 0usize;
        for draft in planned {
            match self.persist_draft(draft).await {
                Ok(()) => created += 1,
                Err(error) => {
                    tracing::error!(skeleton = %draft.skeleton, %error, "Failed to create idea record");
                }
            }
        }

        let mut batch_complete = created == planned.len() && created > 0;
        if batch_complete {
            let patch = SettingsPatch::complete();
            if let Err(error) = self.store.update_settings(&settings.record_id, &patch).await {
                tracing::warn!(%error, "Failed to mark batch complete in settings");
                batch_complete = false;
            }
        }

        if settings.email_notifications && created == batch_size {
            self.notify(&settings.notification_emails, planned).await;
        }

        tracing::info!(planned = planned.len(), created, batch_complete, "Batch run finished");

        Ok(BatchReport {
            planned: planned.len(),
            created,
            batch_complete,
            ideas: generated.ideas,
            timestamp: generated.timestamp,
        })
    }

    /// Create one Proposed idea record, resolving its parent link first.
    ///
    /// A parent that cannot be resolved downgrades to an unlinked idea
    /// rather than losing the draft.
    async fn persist_draft(&self, draft: &GeneratedIdea) -> Result<(), StoreError> {
        let parent_record_id = match draft.parent_structure_id {
            Some(id) => match self.store.structure_record_id(id).await {
                Ok(record_id) => Some(record_id),
                Err(error) => {
                    tracing::warn!(
                        structure_id = id,
                        %error,
                        "Parent structure not resolved; creating idea without parent"
                    );
                    None
                }
            },
            None => None,
        };

        let new = NewIdea {
            skeleton: draft.skeleton.clone(),
            renderer: draft.renderer.clone(),
            proposed_by: PROPOSED_BY_AI.to_string(),
            parent_record_id,
            reward_estimate: Some(draft.reward_estimate),
            notes: Some(draft.rationale.clone()),
        };
        self.store.create_idea(&new).await?;
        Ok(())
    }

    async fn notify(&self, recipients: &[String], ideas: &[GeneratedIdea]) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(error) = notifier.batch_complete(recipients, ideas).await {
            tracing::warn!(%error, "Batch notification failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
