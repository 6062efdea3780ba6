//! # REST API for Subtasks

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{CreateSubtaskRequest, UpdateSubtaskRequest};
use tracing::info;

use super::error::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_subtask))
        .route("/:subtask_id", get(get_subtask).put(update_subtask).delete(delete_subtask))
        .route("/:subtask_id/complete", post(complete_subtask))
}

pub async fn create_subtask(
    State(state): State<AppState>,
    Json(request): Json<CreateSubtaskRequest>,
) -> impl IntoResponse {
    info!("POST /api/subtasks - request: {:?}", request);

    match state.subtask_service.create_subtask(request).await {
        Ok(subtask) => (StatusCode::CREATED, Json(subtask)).into_response(),
        Err(e) => error_response("Failed to create subtask", e),
    }
}

pub async fn get_subtask(
    State(state): State<AppState>,
    Path(subtask_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/subtasks/{}", subtask_id);

    match state.subtask_service.get_subtask(&subtask_id).await {
        Ok(subtask) => (StatusCode::OK, Json(subtask)).into_response(),
        Err(e) => error_response("Failed to get subtask", e),
    }
}

pub async fn update_subtask(
    State(state): State<AppState>,
    Path(subtask_id): Path<String>,
    Json(request): Json<UpdateSubtaskRequest>,
) -> impl IntoResponse {
    info!("PUT /api/subtasks/{} - request: {:?}", subtask_id, request);

    match state.subtask_service.update_subtask(&subtask_id, request).await {
        Ok(subtask) => (StatusCode::OK, Json(subtask)).into_response(),
        Err(e) => error_response("Failed to update subtask", e),
    }
}

pub async fn delete_subtask(
    State(state): State<AppState>,
    Path(subtask_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/subtasks/{}", subtask_id);

    match state.subtask_service.delete_subtask(&subtask_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete subtask", e),
    }
}

/// Complete a subtask; the last one completes its parent quest
pub async fn complete_subtask(
    State(state): State<AppState>,
    Path(subtask_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/subtasks/{}/complete", subtask_id);

    match state.subtask_service.complete_subtask(&subtask_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response("Failed to complete subtask", e),
    }
}
