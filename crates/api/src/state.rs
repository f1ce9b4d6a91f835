use std::sync::Arc;

use atelier_pipeline::{BatchRunner, Lifecycle, Provenance};
use atelier_render::RenderClient;
use atelier_store::RecordStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable; all inner data is behind `Arc` or is `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Record store adapter shared by every handler.
    pub store: Arc<dyn RecordStore>,
    /// Idea review-transition service.
    pub lifecycle: Arc<Lifecycle>,
    /// Batch orchestrator.
    pub runner: Arc<BatchRunner>,
    /// Image-render provider client.
    pub render: Arc<RenderClient>,
    /// Generation provenance recorded on approved structures.
    pub provenance: Provenance,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
