//! Image-render collaborator.
//!
//! A prediction-style render API: submit a prompt for a known backend,
//! poll its status, optionally cancel it. Consumed as a black box; the
//! only domain knowledge here is which model id and input shape each
//! [`RendererKind`](atelier_core::renderer::RendererKind) maps to.

pub mod client;
pub mod config;

pub use client::{Prediction, PredictionStatus, RenderClient, RenderError};
pub use config::RenderConfig;
