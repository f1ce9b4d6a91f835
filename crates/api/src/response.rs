//! Shared response envelope for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope so the dashboard
//! client can unwrap every endpoint the same way.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
