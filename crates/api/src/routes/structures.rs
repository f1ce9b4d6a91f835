//! Structure history listing.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use atelier_core::structure::PromptStructure;
use atelier_store::StructureView;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /structures`.
#[derive(Debug, Deserialize)]
struct StructuresQuery {
    /// `all` (default), `top`, or `underexplored`.
    view: Option<String>,
}

/// GET /api/structures
///
/// List structures from a named view, each decorated with its current
/// reward score.
async fn list_structures(
    State(state): State<AppState>,
    Query(params): Query<StructuresQuery>,
) -> AppResult<Json<DataResponse<Vec<PromptStructure>>>> {
    let view = match params.view.as_deref() {
        None | Some("all") => StructureView::All,
        Some("top") => StructureView::TopPerformers,
        Some("underexplored") => StructureView::Underexplored,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unknown structures view '{other}'; expected all, top, or underexplored"
            )))
        }
    };
    let structures = state.store.list_structures(view).await?;
    Ok(Json(DataResponse { data: structures }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_structures))
}
