//! The [`PromptStructure`] record: an approved prompt template eligible
//! for reuse and for informing future generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::StructureStatus;

/// An active prompt template with its externally-maintained performance
/// metrics.
///
/// The four metric fields (`outlier_count`, `usage_count`, `age_weeks`,
/// `z_score`) and `ai_score` are written by store-side automation, never
/// by this system. `reward_score` is derived on every read and never
/// persisted, so weight tuning takes effect retroactively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptStructure {
    /// Opaque storage record id.
    pub record_id: String,
    /// Human-facing sequence id, immutable once assigned by the store.
    pub structure_id: i64,
    pub skeleton: String,
    pub renderer: String,
    pub status: StructureStatus,
    /// Count of unusually high-performing renders.
    pub outlier_count: f64,
    pub usage_count: f64,
    pub age_weeks: f64,
    pub z_score: f64,
    /// 0-10 quality judgment, externally assigned.
    pub ai_score: f64,
    pub ai_critique: Option<String>,
    pub trend: Option<String>,
    /// Model that generated the originating idea, for reproducibility.
    pub model_used: Option<String>,
    /// Exact generator system prompt that produced it.
    pub system_prompt: Option<String>,
    pub date_created: DateTime<Utc>,
    /// Derived by the reward scorer on read; `None` until decorated.
    pub reward_score: Option<f64>,
}

/// Fields for creating a new structure record.
///
/// Created only by the approval transition. The metric columns are left
/// untouched; store-side automation owns them.
#[derive(Debug, Clone)]
pub struct NewStructure {
    pub skeleton: String,
    pub renderer: String,
    /// Seeded from the source idea's reward estimate.
    pub ai_score: Option<f64>,
    pub model_used: Option<String>,
    pub system_prompt: Option<String>,
    /// Storage record id of the originating idea.
    pub source_idea_record_id: Option<String>,
}
