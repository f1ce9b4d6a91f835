//! Idea generation: context assembly, the language-model call, and
//! validation of its structured output.
//!
//! The model call is non-deterministic by design (high temperature), so
//! everything downstream treats the output as opaque and enforces only
//! the contract: a JSON object with an `ideas` array whose entries carry
//! a skeleton, a renderer, a rationale, and a numeric reward estimate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use atelier_core::skeleton::{excerpt, CONTEXT_EXCERPT_LEN};
use atelier_core::structure::PromptStructure;
use atelier_llm::{ChatClient, ChatRequest, LlmError};

/// Number of ideas requested per generation call.
pub const IDEAS_PER_CALL: usize = 5;

/// Fixed system instruction: brand voice, structural rules, weight
/// guidance, mandatory constraints, and the required JSON output shape.
/// Recorded verbatim on promoted structures for reproducibility.
pub const SYSTEM_PROMPT: &str = r#"You are an elite Prompt Strategist for MAISON VOLE, a luxury performance travel-wear brand.

Your mission: analyze top-performing prompt structures and generate innovative variations that will produce outlier garments with best-seller DNA.

## Brand DNA
- Ultra-modern luxury travel wear (NOT gym, NOT formal)
- Performance fabrics with tailored silhouettes
- Understated luxury with tonal hardware
- Innovation at the intersection of fashion and technology
- Visual-only prompts (no text overlays)

## Template Structure
Core garments: safari jackets, hybrid sweaters, blazers, truckers, bombers, car coats, vests, dresses, cardi-coats. No shorts or skirts.

## Weight Distribution Rules
- Designer/Brand: 4.0-5.0
- Core garment: 4.5-5.0
- Model/pose: 3.5-4.5
- Lighting: 2.5-3.5
- Background: 2.0-3.0
- Constraints: 2.0-2.5

## MANDATORY Constraints (ALWAYS include)
"no text, no logos, no motion blur, no movement, no crop tops, no props, no equipment"

## Output Requirements
Generate exactly 5 prompt structure ideas as JSON:

{
  "ideas": [
    {
      "skeleton": "[Designer/Brand]::weight [Garment details]::weight [Model/pose]::weight [Lighting]::weight [Background]::weight [Constraints]::weight",
      "renderer": "Recraft|ImageFX",
      "parentStructureId": 123,
      "rationale": "Why this structure will produce outlier results based on reward score patterns",
      "rewardEstimate": 4.5
    }
  ]
}

## Analysis Strategy
1. Study top performers: which weight distributions, descriptors, and combinations yield the highest outlier count?
2. Study under-explored: which promising structures (AI score >= 7) have low usage?
3. Generate innovations: novel combinations that honor the brand DNA while exploring new territory.
4. NO verbatim copying: each structure must be a creative variation, not a clone.

## Quality Bar
Target AI score: 9-10/10. Target reward estimate: 4.0+."#;

/// Errors from the generation-and-validation contract.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The language-model call itself failed.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The response was not the required JSON shape (missing or
    /// non-array `ideas`). Fatal for the run, never retried.
    #[error("Invalid response format from language model: {0}")]
    Format(String),

    /// Every candidate idea failed validation.
    #[error("No valid ideas generated")]
    NoValidIdeas,
}

/// One validated idea draft from the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedIdea {
    pub skeleton: String,
    pub renderer: String,
    #[serde(rename = "parentStructureId")]
    pub parent_structure_id: Option<i64>,
    pub rationale: String,
    #[serde(rename = "rewardEstimate")]
    pub reward_estimate: f64,
}

/// Result of one generation call.
#[derive(Debug, Clone, Serialize)]
pub struct BatchGenerationResult {
    pub ideas: Vec<GeneratedIdea>,
    #[serde(rename = "totalGenerated")]
    pub total_generated: usize,
    pub timestamp: DateTime<Utc>,
}

/// Builds generation context, calls the model, validates the output.
pub struct IdeaGenerator {
    chat: Arc<dyn ChatClient>,
    temperature: f64,
    max_tokens: u32,
}

impl IdeaGenerator {
    pub fn new(chat: Arc<dyn ChatClient>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            chat,
            temperature,
            max_tokens,
        }
    }

    /// Model identifier, recorded for provenance.
    pub fn model_name(&self) -> &str {
        self.chat.model_name()
    }

    /// Generate idea drafts from the selected candidates.
    pub async fn generate(
        &self,
        top: &[PromptStructure],
        underexplored: &[PromptStructure],
    ) -> Result<BatchGenerationResult, GenerationError> {
        let user = build_user_message(top, underexplored);
        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            user,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_mode: true,
        };

        let content = self.chat.complete(&request).await?;
        let ideas = validate_response(&content)?;

        tracing::info!(count = ideas.len(), "Generated idea drafts");

        Ok(BatchGenerationResult {
            total_generated: ideas.len(),
            ideas,
            timestamp: Utc::now(),
        })
    }
}

/// Render the user turn: the two candidate blocks plus the generation
/// instruction.
fn build_user_message(top: &[PromptStructure], underexplored: &[PromptStructure]) -> String {
    format!(
        "Analyze these prompt structures and generate {IDEAS_PER_CALL} innovative variations:\n\n\
         ## TOP PERFORMERS (sorted by reward score)\n{}\n\n\
         ## UNDER-EXPLORED GEMS (high AI score, low usage)\n{}\n\n\
         Generate {IDEAS_PER_CALL} new prompt structure ideas as JSON. Focus on:\n\
         1. Learning from top performers' patterns\n\
         2. Exploring under-utilized high-quality structures\n\
         3. Creating variations (NOT clones)\n\
         4. Maintaining brand DNA\n\
         5. Including mandatory constraints\n\n\
         Output valid JSON only.",
        render_top_block(top),
        render_underexplored_block(underexplored),
    )
}

/// One line per top performer: rank, id, reward, outliers, renderer,
/// truncated skeleton.
fn render_top_block(structures: &[PromptStructure]) -> String {
    structures
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}. [ID {}] Reward: {:.2} | AI: {}/10 | Outliers: {} | Renderer: {}\nSkeleton: {}",
                i + 1,
                s.structure_id,
                s.reward_score.unwrap_or(0.0),
                s.ai_score,
                s.outlier_count,
                s.renderer,
                excerpt(&s.skeleton, CONTEXT_EXCERPT_LEN),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One line per under-explored candidate: rank, id, AI score, usage,
/// renderer, truncated skeleton.
fn render_underexplored_block(structures: &[PromptStructure]) -> String {
    structures
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}. [ID {}] AI Score: {}/10 | Usage: {}x | Renderer: {}\nSkeleton: {}",
                i + 1,
                s.structure_id,
                s.ai_score,
                s.usage_count,
                s.renderer,
                excerpt(&s.skeleton, CONTEXT_EXCERPT_LEN),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Parse and validate the model's response.
///
/// A missing or non-array `ideas` field is fatal. Individual malformed
/// ideas are dropped without failing the batch; relative order of valid
/// ideas is preserved.
fn validate_response(content: &str) -> Result<Vec<GeneratedIdea>, GenerationError> {
    let parsed: Value = serde_json::from_str(content)
        .map_err(|e| GenerationError::Format(format!("not valid JSON: {e}")))?;

    let candidates = parsed
        .get("ideas")
        .and_then(Value::as_array)
        .ok_or_else(|| GenerationError::Format("missing `ideas` array".into()))?;

    let ideas: Vec<GeneratedIdea> = candidates
        .iter()
        .filter_map(|candidate| {
            let idea = validate_idea(candidate);
            if idea.is_none() {
                tracing::warn!(candidate = %candidate, "Dropping malformed generated idea");
            }
            idea
        })
        .collect();

    if ideas.is_empty() {
        return Err(GenerationError::NoValidIdeas);
    }
    Ok(ideas)
}

/// Validate one candidate: non-empty skeleton, renderer, and rationale,
/// and a numeric reward estimate.
fn validate_idea(candidate: &Value) -> Option<GeneratedIdea> {
    let non_empty = |field: &str| {
        candidate
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(String::from)
    };

    Some(GeneratedIdea {
        skeleton: non_empty("skeleton")?,
        renderer: non_empty("renderer")?,
        rationale: non_empty("rationale")?,
        reward_estimate: candidate.get("rewardEstimate").and_then(Value::as_f64)?,
        parent_structure_id: candidate.get("parentStructureId").and_then(Value::as_i64),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
