//! Language-model collaborator.
//!
//! A single synchronous-style call: system instruction + user message in,
//! one text completion out, optionally constrained to JSON output. The
//! pipeline consumes the [`ChatClient`] trait; [`OpenAiClient`] is the
//! chat-completions implementation.

pub mod client;
pub mod config;

pub use client::{ChatClient, ChatRequest, LlmError, OpenAiClient};
pub use config::LlmConfig;
