//! Domain-level error type shared across the workspace.

/// Errors produced by domain logic in `atelier-core`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed a domain validation rule. Reported to the caller,
    /// never retried, never logged as a system fault.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// An unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
