//! Route definitions, one module per resource.

use axum::Router;

use crate::state::AppState;

pub mod batch;
pub mod health;
pub mod ideas;
pub mod render;
pub mod settings;
pub mod structures;

/// All resource routes, mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/batch", batch::router())
        .nest("/ideas", ideas::router())
        .nest("/settings", settings::router())
        .nest("/structures", structures::router())
        .nest("/render", render::router())
}
