use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use atelier_core::error::CoreError;
use atelier_pipeline::{BatchError, GenerationError, LifecycleError, SelectError};
use atelier_render::RenderError;
use atelier_store::StoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain and upstream error types and implements
/// [`IntoResponse`] to produce consistent `{error, code}` JSON bodies.
/// Upstream provider faults map to 502; their raw messages are logged
/// but never forwarded to the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Store(store) => classify_store_error(store),

            AppError::Lifecycle(lifecycle) => match lifecycle {
                LifecycleError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION", lifecycle.to_string())
                }
                LifecycleError::Core(core) => classify_core_error(core),
                LifecycleError::Store(store) => classify_store_error(store),
                // The message carries both record ids for manual repair.
                LifecycleError::LinkFailed { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LINK_FAILED",
                    lifecycle.to_string(),
                ),
            },

            AppError::Batch(batch) => match batch {
                BatchError::Disabled => (
                    StatusCode::CONFLICT,
                    "BATCH_DISABLED",
                    "Batch generation is disabled in settings".to_string(),
                ),
                BatchError::Select(SelectError::NoCandidates) => (
                    StatusCode::CONFLICT,
                    "NO_CANDIDATES",
                    "No candidate structures available for generation".to_string(),
                ),
                BatchError::Select(SelectError::Store(store)) => classify_store_error(store),
                BatchError::Generation(generation) => classify_generation_error(generation),
                BatchError::Store(store) => classify_store_error(store),
            },

            AppError::Render(render) => match render {
                RenderError::MissingApiToken => {
                    tracing::error!("Render provider token missing");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
                _ => {
                    tracing::error!(error = %render, "Render provider request failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_ERROR",
                        "Image render provider request failed".to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a store error into an HTTP status, error code, and message.
///
/// - `NotFound` and `MissingSettings` map to 404.
/// - Transport, response, and decode faults map to 502 with a sanitized
///   message; the raw fault is logged.
/// - Configuration errors map to 500; they should have failed startup.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        StoreError::MissingSettings => (
            StatusCode::NOT_FOUND,
            "SETTINGS_MISSING",
            "No settings record found".to_string(),
        ),
        StoreError::Config(_) => {
            tracing::error!(error = %err, "Store configuration error surfaced at request time");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        StoreError::Request(_) | StoreError::Response { .. } | StoreError::Decode(_) => {
            tracing::error!(error = %err, "Record store request failed");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Record store request failed".to_string(),
            )
        }
    }
}

fn classify_generation_error(err: &GenerationError) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Idea generation failed");
    match err {
        GenerationError::Format(_) | GenerationError::NoValidIdeas => (
            StatusCode::BAD_GATEWAY,
            "GENERATION_ERROR",
            err.to_string(),
        ),
        GenerationError::Llm(_) => (
            StatusCode::BAD_GATEWAY,
            "UPSTREAM_ERROR",
            "Language model request failed".to_string(),
        ),
    }
}
