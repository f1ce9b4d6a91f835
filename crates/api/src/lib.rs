//! Atelier review-dashboard API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes)
//! so the binary entrypoint and router tests share the same stack.

pub mod config;
pub mod error;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
