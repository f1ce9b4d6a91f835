//! Error type for record-store operations.

/// Errors surfaced by the record store adapter.
///
/// `NotFound` and `MissingSettings` are distinguishable from transport
/// and server failures so that callers can tell "unknown record id"
/// apart from "the store is unreachable".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Required store configuration is absent. Carries every missing
    /// variable name, not just the first.
    #[error("Missing required store configuration: {}", .0.join(", "))]
    Config(Vec<String>),

    /// The HTTP request could not be executed (network, DNS, timeout).
    #[error("Store request failed: {0}")]
    Request(String),

    /// The store answered with a non-success status.
    #[error("Store returned HTTP {status}: {message}")]
    Response { status: u16, message: String },

    /// The response body did not match the expected wire shape.
    #[error("Failed to decode store response: {0}")]
    Decode(String),

    /// A lookup by id or sequence number matched nothing.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The settings view returned no records; exactly one must exist.
    #[error("No settings record found")]
    MissingSettings,
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Request(err.to_string())
    }
}
