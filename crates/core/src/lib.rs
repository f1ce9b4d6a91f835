//! Domain types and pure decision logic for the prompt-structure review
//! platform: idea/structure records, the reward scorer, status transition
//! rules, and renderer resolution.
//!
//! Everything in this crate is side-effect free. Persistence lives in
//! `atelier-store`, external service clients in `atelier-llm` and
//! `atelier-render`, and orchestration in `atelier-pipeline`.

pub mod error;
pub mod idea;
pub mod renderer;
pub mod reward;
pub mod settings;
pub mod skeleton;
pub mod status;
pub mod structure;

pub use error::CoreError;
