//! The reward-driven structure lifecycle and batch-generation pipeline.
//!
//! Data flow for one batch run: settings gate the run, the
//! [`selector`] pulls and ranks scored structures from the record store,
//! the [`generator`] turns them into new idea drafts via the language
//! model, and the [`batch`] orchestrator persists validated drafts as
//! Proposed ideas. All later status changes go through the
//! [`lifecycle`] service, which promotes an approved idea into a new
//! structure linked back to its origin.
//!
//! Ordering within a run is strict: selection completes before
//! generation, generation before any persistence. Per-idea creations in
//! the orchestrator are independent of each other.

pub mod batch;
pub mod generator;
pub mod lifecycle;
pub mod notify;
pub mod selector;

#[cfg(test)]
mod test_support;

pub use batch::{BatchError, BatchReport, BatchRunner};
pub use generator::{BatchGenerationResult, GeneratedIdea, GenerationError, IdeaGenerator};
pub use lifecycle::{ApprovalOutcome, Lifecycle, LifecycleError, Provenance};
pub use notify::{BatchNotifier, NotifyError, WebhookNotifier};
pub use selector::{select_candidates, CandidateSet, SelectError, SelectorConfig};
