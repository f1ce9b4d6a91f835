//! Batch-settings read and sparse update.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use atelier_core::settings::{BatchSettings, SettingsPatch};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `PATCH /settings`. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
struct UpdateSettingsRequest {
    batch_enabled: Option<bool>,
    batch_size: Option<u32>,
    next_batch_time: Option<String>,
    email_notifications: Option<bool>,
    notification_emails: Option<Vec<String>>,
}

/// GET /api/settings
async fn fetch_settings(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<BatchSettings>>> {
    let settings = state.store.fetch_settings().await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PATCH /api/settings
///
/// Sparse update against the singleton record. The record id comes from
/// a fresh fetch; writes are last-write-wins.
async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingsRequest>,
) -> AppResult<Json<DataResponse<BatchSettings>>> {
    if let Some(size) = body.batch_size {
        if size == 0 {
            return Err(AppError::BadRequest("batch_size must be at least 1".into()));
        }
    }

    let current = state.store.fetch_settings().await?;
    let patch = SettingsPatch {
        batch_enabled: body.batch_enabled,
        batch_size: body.batch_size,
        next_batch_time: body.next_batch_time,
        email_notifications: body.email_notifications,
        notification_emails: body.notification_emails,
        batch_complete: None,
    };
    let updated = state.store.update_settings(&current.record_id, &patch).await?;
    Ok(Json(DataResponse { data: updated }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(fetch_settings).patch(update_settings))
}
