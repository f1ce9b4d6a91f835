//! The [`PromptIdea`] record and its creation/update input types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::IdeaStatus;

/// Provenance label written for ideas created by the batch pipeline.
pub const PROPOSED_BY_AI: &str = "AI System";

/// A proposed prompt template awaiting review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptIdea {
    /// Opaque storage record id.
    pub record_id: String,
    /// Human-facing sequence id assigned by the store.
    pub idea_id: i64,
    /// Target image-generation backend name as stored.
    pub renderer: String,
    /// The prompt template text (bracketed placeholders, `::weight`
    /// annotations).
    pub skeleton: String,
    pub status: IdeaStatus,
    /// Planner-assigned reward estimate.
    pub reward_estimate: Option<f64>,
    /// 1-5 star rating, set after a test render.
    pub rating: Option<u8>,
    /// Free-text provenance: a reviewer name or [`PROPOSED_BY_AI`].
    pub proposed_by: String,
    pub notes: Option<String>,
    /// Append-only review feedback; see
    /// [`append_feedback`](Self::append_feedback).
    pub feedback: Option<String>,
    /// Last rendered preview image.
    pub test_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set iff status is `Approved`. Mutually exclusive with
    /// `declined_at`.
    pub approved_at: Option<DateTime<Utc>>,
    /// Set iff status is `Declined`.
    pub declined_at: Option<DateTime<Utc>>,
    /// Storage record id of the structure that inspired this idea.
    pub parent_record_id: Option<String>,
    /// Sequence id of the structure this idea was promoted into.
    pub structure_id: Option<i64>,
    /// Storage record id of the promoted structure.
    pub structure_record_id: Option<String>,
}

impl PromptIdea {
    /// Combine existing feedback with a new entry.
    ///
    /// Feedback is cumulative: prior text is always preserved, the new
    /// entry is appended after a blank line.
    pub fn append_feedback(&self, entry: &str) -> String {
        match self.feedback.as_deref().filter(|f| !f.is_empty()) {
            Some(prior) => format!("{prior}\n\n{entry}"),
            None => entry.to_string(),
        }
    }
}

/// Fields for creating a new idea record.
///
/// Status is always written as `Proposed` by the store adapter.
#[derive(Debug, Clone)]
pub struct NewIdea {
    pub skeleton: String,
    pub renderer: String,
    pub proposed_by: String,
    /// Storage record id of the inspiring structure, if any.
    pub parent_record_id: Option<String>,
    pub reward_estimate: Option<f64>,
    pub notes: Option<String>,
}

/// Sparse update for an idea record.
///
/// Only fields that are `Some` are written; omission never clears a
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct IdeaPatch {
    pub status: Option<IdeaStatus>,
    pub rating: Option<u8>,
    /// Full replacement feedback text (callers append before patching).
    pub feedback: Option<String>,
    pub notes: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub declined_at: Option<DateTime<Utc>>,
    pub test_image_url: Option<String>,
    /// Sequence id of the structure to link, resolved to a record id by
    /// the adapter.
    pub structure_id: Option<i64>,
}

/// Validate a 1-5 star rating.
pub fn validate_rating(rating: u8) -> Result<(), CoreError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Rating must be between 1 and 5, got {rating}"
        )))
    }
}
