//! Reward scoring for prompt structures.
//!
//! The reward is a weighted combination of quality (`ai_score`), novelty
//! (`outlier_count`), and freshness (`age_weeks`, negative weight so
//! older structures are nudged down). The score is recomputed on every
//! read and never persisted, so changing the weights reorders rankings
//! immediately.

use crate::structure::PromptStructure;

/// Default weight for the external 0-10 quality score.
pub const DEFAULT_WEIGHT_AI_SCORE: f64 = 0.6;

/// Default weight for the outlier-render count.
pub const DEFAULT_WEIGHT_OUTLIER: f64 = 0.3;

/// Default weight for age in weeks (negative: staleness penalty).
pub const DEFAULT_WEIGHT_AGE: f64 = -0.1;

/// Weights for the reward formula. Configuration, not hardcoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardWeights {
    pub ai_score: f64,
    pub outlier: f64,
    pub age: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            ai_score: DEFAULT_WEIGHT_AI_SCORE,
            outlier: DEFAULT_WEIGHT_OUTLIER,
            age: DEFAULT_WEIGHT_AGE,
        }
    }
}

impl RewardWeights {
    /// Load weights from environment variables, falling back to the
    /// defaults for unset or unparseable values.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `REWARD_WEIGHT_AI_SCORE` | `0.6`   |
    /// | `REWARD_WEIGHT_OUTLIER`  | `0.3`   |
    /// | `REWARD_WEIGHT_AGE`      | `-0.1`  |
    pub fn from_env() -> Self {
        fn var_or(name: &str, default: f64) -> f64 {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
        Self {
            ai_score: var_or("REWARD_WEIGHT_AI_SCORE", DEFAULT_WEIGHT_AI_SCORE),
            outlier: var_or("REWARD_WEIGHT_OUTLIER", DEFAULT_WEIGHT_OUTLIER),
            age: var_or("REWARD_WEIGHT_AGE", DEFAULT_WEIGHT_AGE),
        }
    }

    /// Compute the reward score for a structure.
    ///
    /// Pure and total: metrics default to 0 in [`PromptStructure`], so
    /// there are no error cases.
    pub fn score(&self, structure: &PromptStructure) -> f64 {
        self.ai_score * structure.ai_score
            + self.outlier * structure.outlier_count
            + self.age * structure.age_weeks
    }
}
