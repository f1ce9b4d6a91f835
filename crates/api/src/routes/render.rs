//! Direct render endpoints, used by the dashboard's ad-hoc test panel.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use validator::Validate;

use atelier_core::renderer::RendererKind;
use atelier_render::Prediction;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /render/generate`.
#[derive(Debug, Deserialize, Validate)]
struct GenerateRequest {
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    prompt: String,
    #[validate(length(min = 1, message = "renderer must not be empty"))]
    renderer: String,
}

/// POST /api/render/generate
async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> AppResult<Json<DataResponse<Prediction>>> {
    body.validate()?;
    let renderer = RendererKind::resolve(&body.renderer)?;
    let prediction = state.render.generate(renderer, &body.prompt).await?;
    Ok(Json(DataResponse { data: prediction }))
}

/// GET /api/render/prediction/{id}
async fn prediction_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Prediction>>> {
    let prediction = state.render.status(&id).await?;
    Ok(Json(DataResponse { data: prediction }))
}

/// POST /api/render/prediction/{id}/cancel
async fn cancel_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Prediction>>> {
    let prediction = state.render.cancel(&id).await?;
    Ok(Json(DataResponse { data: prediction }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/prediction/{id}", get(prediction_status))
        .route("/prediction/{id}/cancel", post(cancel_prediction))
}
