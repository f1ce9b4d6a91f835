//! Idea listing, manual submission, and review actions.
//!
//! Every action loads the record fresh before running the lifecycle
//! service, so stale dashboard state can never skip a transition guard.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use validator::Validate;

use atelier_core::idea::{NewIdea, PromptIdea};
use atelier_core::renderer::RendererKind;
use atelier_pipeline::ApprovalOutcome;
use atelier_render::Prediction;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /ideas`.
#[derive(Debug, Deserialize)]
struct IdeasQuery {
    /// Store-side view name; defaults to the configured review view.
    view: Option<String>,
}

/// Body for `POST /ideas` (manual submission from the dashboard).
#[derive(Debug, Deserialize, Validate)]
struct CreateIdeaRequest {
    #[validate(length(min = 1, message = "skeleton must not be empty"))]
    skeleton: String,
    #[validate(length(min = 1, message = "renderer must not be empty"))]
    renderer: String,
    #[validate(length(min = 1, message = "proposed_by must not be empty"))]
    proposed_by: String,
    notes: Option<String>,
    /// Sequence id of the inspiring structure, if any.
    parent_structure_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DeclineRequest {
    feedback: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct FeedbackRequest {
    #[validate(length(min = 1, message = "feedback must not be empty"))]
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct RatingRequest {
    rating: u8,
}

/// Response for `POST /ideas/{record_id}/test-render`.
#[derive(Debug, serde::Serialize)]
struct TestRenderResponse {
    prediction: Prediction,
    idea: PromptIdea,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/ideas
async fn list_ideas(
    State(state): State<AppState>,
    Query(params): Query<IdeasQuery>,
) -> AppResult<Json<DataResponse<Vec<PromptIdea>>>> {
    let view = params.view.as_deref().unwrap_or(&state.config.ideas_view);
    let ideas = state.store.list_ideas(view).await?;
    Ok(Json(DataResponse { data: ideas }))
}

/// POST /api/ideas
///
/// Manual idea submission. The renderer name must resolve to a known
/// backend; an unresolvable parent id is a 404 rather than a silent
/// drop, since a human picked it deliberately.
async fn create_idea(
    State(state): State<AppState>,
    Json(body): Json<CreateIdeaRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PromptIdea>>)> {
    body.validate()?;
    RendererKind::resolve(&body.renderer)?;

    let parent_record_id = match body.parent_structure_id {
        Some(id) => Some(state.store.structure_record_id(id).await?),
        None => None,
    };

    let new = NewIdea {
        skeleton: body.skeleton,
        renderer: body.renderer,
        proposed_by: body.proposed_by,
        parent_record_id,
        reward_estimate: None,
        notes: body.notes,
    };
    let idea = state.store.create_idea(&new).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: idea })))
}

/// POST /api/ideas/{record_id}/approve
async fn approve_idea(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> AppResult<Json<DataResponse<ApprovalOutcome>>> {
    let idea = state.store.fetch_idea(&record_id).await?;
    let outcome = state
        .lifecycle
        .approve(&idea, state.provenance.clone())
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/ideas/{record_id}/decline
async fn decline_idea(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    Json(body): Json<DeclineRequest>,
) -> AppResult<Json<DataResponse<PromptIdea>>> {
    let idea = state.store.fetch_idea(&record_id).await?;
    let updated = state.lifecycle.decline(&idea, body.feedback.as_deref()).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/ideas/{record_id}/feedback
async fn append_feedback(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    Json(body): Json<FeedbackRequest>,
) -> AppResult<Json<DataResponse<PromptIdea>>> {
    body.validate()?;
    let idea = state.store.fetch_idea(&record_id).await?;
    let updated = state.lifecycle.append_feedback(&idea, &body.feedback).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/ideas/{record_id}/rating
async fn set_rating(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    Json(body): Json<RatingRequest>,
) -> AppResult<Json<DataResponse<PromptIdea>>> {
    let idea = state.store.fetch_idea(&record_id).await?;
    let updated = state.lifecycle.set_rating(&idea, body.rating).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/ideas/{record_id}/test-render
///
/// Submit the idea's skeleton to its render backend. A Proposed idea
/// moves to Pending first; when the provider returns output inline, the
/// preview URL is stored on the idea.
async fn test_render(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> AppResult<Json<DataResponse<TestRenderResponse>>> {
    let fetched = state.store.fetch_idea(&record_id).await?;
    let renderer = RendererKind::resolve(&fetched.renderer)?;

    let idea = state
        .lifecycle
        .start_test_render(&fetched)
        .await?
        .unwrap_or(fetched);

    let prediction = state.render.generate(renderer, &idea.skeleton).await?;

    let idea = match prediction.output.first() {
        Some(url) => state.lifecycle.record_test_image(&idea, url).await?,
        None => idea,
    };

    Ok(Json(DataResponse {
        data: TestRenderResponse { prediction, idea },
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ideas).post(create_idea))
        .route("/{record_id}/approve", post(approve_idea))
        .route("/{record_id}/decline", post(decline_idea))
        .route("/{record_id}/feedback", post(append_feedback))
        .route("/{record_id}/rating", post(set_rating))
        .route("/{record_id}/test-render", post(test_render))
}
