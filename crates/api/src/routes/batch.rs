//! The batch-run trigger endpoint.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use atelier_pipeline::BatchReport;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/batch/run
///
/// Execute one batch generation run and return its report. A disabled
/// settings gate maps to 409.
async fn run_batch(State(state): State<AppState>) -> AppResult<Json<DataResponse<BatchReport>>> {
    let report = state.runner.run().await?;
    Ok(Json(DataResponse { data: report }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/run", post(run_batch))
}
