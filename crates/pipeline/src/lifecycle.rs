//! Idea review transitions: test render start, approval, decline,
//! rating, and feedback.
//!
//! Approval is the only transition that spans two records. The structure
//! is created first and the idea is linked second, so a failure between
//! the writes can never lose an approved structure; it surfaces as
//! [`LifecycleError::LinkFailed`] carrying both ids for manual repair.

use std::sync::Arc;

use chrono::Utc;

use atelier_core::error::CoreError;
use atelier_core::idea::{validate_rating, IdeaPatch, PromptIdea};
use atelier_core::status::IdeaStatus;
use atelier_core::structure::{NewStructure, PromptStructure};
use atelier_store::{RecordStore, StoreError};

/// Generation provenance recorded on structures promoted from AI ideas.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    pub model_used: Option<String>,
    pub system_prompt: Option<String>,
}

/// Both records touched by a successful approval.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApprovalOutcome {
    pub structure: PromptStructure,
    pub idea: PromptIdea,
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The requested status change is not allowed from the idea's
    /// current status.
    #[error("Cannot transition idea from {from} to {to}")]
    InvalidTransition { from: IdeaStatus, to: IdeaStatus },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The structure exists but the idea still points at nothing. Both
    /// ids are carried so the link can be repaired by hand.
    #[error(
        "Structure {structure_id} ({structure_record_id}) created but linking idea \
         {idea_record_id} failed: {source}"
    )]
    LinkFailed {
        structure_id: i64,
        structure_record_id: String,
        idea_record_id: String,
        #[source]
        source: StoreError,
    },
}

/// Review-transition service over a [`RecordStore`].
pub struct Lifecycle {
    store: Arc<dyn RecordStore>,
}

impl Lifecycle {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn guard(&self, idea: &PromptIdea, to: IdeaStatus) -> Result<(), LifecycleError> {
        if idea.status.can_transition(to) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition {
                from: idea.status,
                to,
            })
        }
    }

    /// Mark a Proposed idea as under review when its first test render
    /// starts. Any other status is left untouched.
    pub async fn start_test_render(
        &self,
        idea: &PromptIdea,
    ) -> Result<Option<PromptIdea>, LifecycleError> {
        if idea.status != IdeaStatus::Proposed {
            return Ok(None);
        }
        let patch = IdeaPatch {
            status: Some(IdeaStatus::Pending),
            ..IdeaPatch::default()
        };
        let updated = self.store.update_idea(&idea.record_id, &patch).await?;
        tracing::info!(idea = %idea.record_id, "Idea moved to Pending for test render");
        Ok(Some(updated))
    }

    /// Promote an idea into an active structure and link the two.
    pub async fn approve(
        &self,
        idea: &PromptIdea,
        provenance: Provenance,
    ) -> Result<ApprovalOutcome, LifecycleError> {
        self.guard(idea, IdeaStatus::Approved)?;

        let new = NewStructure {
            skeleton: idea.skeleton.clone(),
            renderer: idea.renderer.clone(),
            ai_score: idea.reward_estimate,
            model_used: provenance.model_used,
            system_prompt: provenance.system_prompt,
            source_idea_record_id: Some(idea.record_id.clone()),
        };
        let structure = self.store.create_structure(&new).await?;
        tracing::info!(
            idea = %idea.record_id,
            structure_id = structure.structure_id,
            "Created structure from approved idea"
        );

        let patch = IdeaPatch {
            status: Some(IdeaStatus::Approved),
            approved_at: Some(Utc::now()),
            structure_id: Some(structure.structure_id),
            ..IdeaPatch::default()
        };
        let updated = match self.store.update_idea(&idea.record_id, &patch).await {
            Ok(updated) => updated,
            Err(source) => {
                tracing::error!(
                    idea = %idea.record_id,
                    structure_id = structure.structure_id,
                    structure_record = %structure.record_id,
                    error = %source,
                    "Structure created but idea link failed; manual repair required"
                );
                return Err(LifecycleError::LinkFailed {
                    structure_id: structure.structure_id,
                    structure_record_id: structure.record_id,
                    idea_record_id: idea.record_id.clone(),
                    source,
                });
            }
        };

        Ok(ApprovalOutcome {
            structure,
            idea: updated,
        })
    }

    /// Decline an idea, optionally recording review feedback.
    pub async fn decline(
        &self,
        idea: &PromptIdea,
        feedback: Option<&str>,
    ) -> Result<PromptIdea, LifecycleError> {
        self.guard(idea, IdeaStatus::Declined)?;
        let patch = IdeaPatch {
            status: Some(IdeaStatus::Declined),
            declined_at: Some(Utc::now()),
            feedback: feedback.map(|entry| idea.append_feedback(entry)),
            ..IdeaPatch::default()
        };
        let updated = self.store.update_idea(&idea.record_id, &patch).await?;
        tracing::info!(idea = %idea.record_id, "Idea declined");
        Ok(updated)
    }

    /// Append a feedback entry without changing status.
    pub async fn append_feedback(
        &self,
        idea: &PromptIdea,
        entry: &str,
    ) -> Result<PromptIdea, LifecycleError> {
        let patch = IdeaPatch {
            feedback: Some(idea.append_feedback(entry)),
            ..IdeaPatch::default()
        };
        Ok(self.store.update_idea(&idea.record_id, &patch).await?)
    }

    /// Record a 1-5 star rating.
    ///
    /// Ratings are allowed in non-terminal states and after approval;
    /// a declined idea is closed to further review.
    pub async fn set_rating(
        &self,
        idea: &PromptIdea,
        rating: u8,
    ) -> Result<PromptIdea, LifecycleError> {
        validate_rating(rating)?;
        if idea.status == IdeaStatus::Declined {
            return Err(LifecycleError::Core(CoreError::Validation(
                "Cannot rate a declined idea".to_string(),
            )));
        }
        let patch = IdeaPatch {
            rating: Some(rating),
            ..IdeaPatch::default()
        };
        Ok(self.store.update_idea(&idea.record_id, &patch).await?)
    }

    /// Store the latest test-render preview image.
    pub async fn record_test_image(
        &self,
        idea: &PromptIdea,
        url: &str,
    ) -> Result<PromptIdea, LifecycleError> {
        let patch = IdeaPatch {
            test_image_url: Some(url.to_string()),
            ..IdeaPatch::default()
        };
        Ok(self.store.update_idea(&idea.record_id, &patch).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{idea, MockStore};
    use assert_matches::assert_matches;

    fn lifecycle(store: MockStore) -> (Lifecycle, Arc<MockStore>) {
        let store = Arc::new(store);
        (Lifecycle::new(store.clone()), store)
    }

    #[tokio::test]
    async fn approve_creates_structure_then_links_the_idea() {
        let (lifecycle, store) = lifecycle(MockStore::default());
        let mut source = idea("recIdea1", IdeaStatus::Pending);
        source.skeleton = "[X]::5".into();
        source.renderer = "Recraft".into();
        source.reward_estimate = Some(4.5);

        let outcome = lifecycle
            .approve(
                &source,
                Provenance {
                    model_used: Some("gpt-4o".into()),
                    system_prompt: Some("prompt".into()),
                },
            )
            .await
            .unwrap();

        let created = store.created_structures.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].skeleton, "[X]::5");
        assert_eq!(created[0].renderer, "Recraft");
        assert_eq!(created[0].ai_score, Some(4.5));
        assert_eq!(created[0].source_idea_record_id.as_deref(), Some("recIdea1"));

        let patches = store.idea_patches.lock().unwrap();
        assert_eq!(patches.len(), 1);
        let (record, patch) = &patches[0];
        assert_eq!(record, "recIdea1");
        assert_eq!(patch.status, Some(IdeaStatus::Approved));
        assert!(patch.approved_at.is_some());
        assert_eq!(patch.structure_id, Some(outcome.structure.structure_id));
        assert!(patch.declined_at.is_none());
    }

    #[tokio::test]
    async fn approve_link_failure_reports_both_record_ids() {
        let mut store = MockStore::default();
        store.fail_update_idea = true;
        let (lifecycle, store) = lifecycle(store);

        let err = lifecycle
            .approve(&idea("recIdea1", IdeaStatus::Proposed), Provenance::default())
            .await
            .unwrap_err();

        assert_matches!(
            err,
            LifecycleError::LinkFailed { ref idea_record_id, .. } if idea_record_id == "recIdea1"
        );
        // The structure write happened before the failed link.
        assert_eq!(store.created_structures.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn decline_sets_declined_at_and_never_approved_at() {
        let (lifecycle, store) = lifecycle(MockStore::default());

        lifecycle
            .decline(&idea("recIdea1", IdeaStatus::Pending), Some("too busy"))
            .await
            .unwrap();

        let patches = store.idea_patches.lock().unwrap();
        let (_, patch) = &patches[0];
        assert_eq!(patch.status, Some(IdeaStatus::Declined));
        assert!(patch.declined_at.is_some());
        assert!(patch.approved_at.is_none());
        assert_eq!(patch.feedback.as_deref(), Some("too busy"));
    }

    #[tokio::test]
    async fn terminal_ideas_reject_further_transitions() {
        let (lifecycle, _) = lifecycle(MockStore::default());

        let err = lifecycle
            .approve(&idea("recIdea1", IdeaStatus::Declined), Provenance::default())
            .await
            .unwrap_err();
        assert_matches!(err, LifecycleError::InvalidTransition { .. });

        let err = lifecycle
            .decline(&idea("recIdea2", IdeaStatus::Approved), None)
            .await
            .unwrap_err();
        assert_matches!(err, LifecycleError::InvalidTransition { .. });
    }

    #[tokio::test]
    async fn first_test_render_moves_proposed_to_pending_only() {
        let (lifecycle, store) = lifecycle(MockStore::default());

        let moved = lifecycle
            .start_test_render(&idea("recIdea1", IdeaStatus::Proposed))
            .await
            .unwrap();
        assert_eq!(moved.unwrap().status, IdeaStatus::Pending);

        let unchanged = lifecycle
            .start_test_render(&idea("recIdea2", IdeaStatus::Approved))
            .await
            .unwrap();
        assert!(unchanged.is_none());
        // Only the Proposed idea produced a write.
        assert_eq!(store.idea_patches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn feedback_is_cumulative() {
        let (lifecycle, store) = lifecycle(MockStore::default());
        let mut reviewed = idea("recIdea1", IdeaStatus::Pending);
        reviewed.feedback = Some("first pass".into());

        lifecycle.append_feedback(&reviewed, "second pass").await.unwrap();

        let patches = store.idea_patches.lock().unwrap();
        let (_, patch) = &patches[0];
        assert_eq!(patch.feedback.as_deref(), Some("first pass\n\nsecond pass"));
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected_before_any_write() {
        let (lifecycle, store) = lifecycle(MockStore::default());

        let err = lifecycle
            .set_rating(&idea("recIdea1", IdeaStatus::Pending), 6)
            .await
            .unwrap_err();
        assert_matches!(err, LifecycleError::Core(CoreError::Validation(_)));
        assert!(store.idea_patches.lock().unwrap().is_empty());

        lifecycle
            .set_rating(&idea("recIdea1", IdeaStatus::Pending), 4)
            .await
            .unwrap();
        assert_eq!(store.idea_patches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn declined_ideas_cannot_be_rated() {
        let (lifecycle, store) = lifecycle(MockStore::default());

        let err = lifecycle
            .set_rating(&idea("recIdea1", IdeaStatus::Declined), 3)
            .await
            .unwrap_err();
        assert_matches!(err, LifecycleError::Core(CoreError::Validation(_)));
        assert!(store.idea_patches.lock().unwrap().is_empty());

        // Approval closes the transition graph but not the rating.
        lifecycle
            .set_rating(&idea("recIdea2", IdeaStatus::Approved), 5)
            .await
            .unwrap();
        assert_eq!(store.idea_patches.lock().unwrap().len(), 1);
    }
}
