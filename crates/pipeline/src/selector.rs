//! Candidate selection for generation context.
//!
//! Two ranked lists feed the generator: the best-rewarded structures
//! from the store's top-performers view, and promising low-usage
//! structures from the under-explored view. View semantics are defined
//! store-side; this component only ranks and truncates what the views
//! return.

use std::cmp::Ordering;

use atelier_core::status::StructureStatus;
use atelier_core::structure::PromptStructure;
use atelier_store::{RecordStore, StoreError, StructureView};

/// Errors during candidate selection.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// The top-performers view returned no active structures. Generating
    /// from zero context produces meaningless output, so the batch must
    /// abort instead of silently proceeding.
    #[error("No candidate structures available for generation")]
    NoCandidates,

    /// The record store failed. Fatal for the run.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Selection bounds.
#[derive(Debug, Clone, Copy)]
pub struct SelectorConfig {
    /// Maximum top performers fed to the generator.
    pub top_count: usize,
    /// Maximum under-explored structures fed to the generator.
    pub explore_count: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            top_count: 10,
            explore_count: 3,
        }
    }
}

impl SelectorConfig {
    /// Load bounds from `SELECTOR_TOP_COUNT` / `SELECTOR_EXPLORE_COUNT`,
    /// defaulting to 10 and 3.
    pub fn from_env() -> Self {
        fn var_or(name: &str, default: usize) -> usize {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
        Self {
            top_count: var_or("SELECTOR_TOP_COUNT", 10),
            explore_count: var_or("SELECTOR_EXPLORE_COUNT", 3),
        }
    }
}

/// The two candidate lists handed to the generator.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    /// Active structures sorted by reward score, best first.
    pub top: Vec<PromptStructure>,
    /// Active structures sorted by AI score, best first.
    pub underexplored: Vec<PromptStructure>,
}

/// Fetch, rank, and truncate the generation candidates.
pub async fn select_candidates(
    store: &dyn RecordStore,
    config: &SelectorConfig,
) -> Result<CandidateSet, SelectError> {
    let top = store.list_structures(StructureView::TopPerformers).await?;
    let mut top: Vec<PromptStructure> = top
        .into_iter()
        .filter(|s| s.status == StructureStatus::Active)
        .collect();
    top.sort_by(|a, b| descending(a.reward_score.unwrap_or(0.0), b.reward_score.unwrap_or(0.0)));
    top.truncate(config.top_count);

    if top.is_empty() {
        return Err(SelectError::NoCandidates);
    }

    let underexplored = store.list_structures(StructureView::Underexplored).await?;
    let mut underexplored: Vec<PromptStructure> = underexplored
        .into_iter()
        .filter(|s| s.status == StructureStatus::Active)
        .collect();
    underexplored.sort_by(|a, b| descending(a.ai_score, b.ai_score));
    underexplored.truncate(config.explore_count);

    tracing::debug!(
        top = top.len(),
        underexplored = underexplored.len(),
        "Selected generation candidates"
    );

    Ok(CandidateSet { top, underexplored })
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
