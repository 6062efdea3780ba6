//! # REST API for Quest Management
//!
//! Endpoints for creating, editing, listing and completing quests, plus the
//! recurring-quest progress and reset endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{CreateQuestRequest, QuestListRequest, UpdateQuestRequest};
use tracing::info;

use super::error::error_response;
use crate::AppState;

/// Create a router for quest related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quests).post(create_quest))
        .route("/stats", get(get_quest_stats))
        .route("/overdue", get(get_overdue_quests))
        .route("/recurring/reset", post(reset_recurring_quests))
        .route("/:quest_id", get(get_quest).put(update_quest).delete(delete_quest))
        .route("/:quest_id/complete", post(complete_quest))
        .route("/:quest_id/complete-recurring", post(complete_recurring_quest))
        .route("/:quest_id/progress", get(get_recurring_progress))
        .route("/:quest_id/subtasks", get(list_quest_subtasks))
}

pub async fn list_quests(
    State(state): State<AppState>,
    Query(request): Query<QuestListRequest>,
) -> impl IntoResponse {
    info!("GET /api/quests - request: {:?}", request);

    match state.quest_service.list_quests(request).await {
        Ok(quests) => (StatusCode::OK, Json(quests)).into_response(),
        Err(e) => error_response("Failed to list quests", e),
    }
}

pub async fn create_quest(
    State(state): State<AppState>,
    Json(request): Json<CreateQuestRequest>,
) -> impl IntoResponse {
    info!("POST /api/quests - request: {:?}", request);

    match state.quest_service.create_quest(request).await {
        Ok(quest) => (StatusCode::CREATED, Json(quest)).into_response(),
        Err(e) => error_response("Failed to create quest", e),
    }
}

pub async fn get_quest(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/quests/{}", quest_id);

    match state.quest_service.get_quest(&quest_id).await {
        Ok(quest) => (StatusCode::OK, Json(quest)).into_response(),
        Err(e) => error_response("Failed to get quest", e),
    }
}

pub async fn update_quest(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
    Json(request): Json<UpdateQuestRequest>,
) -> impl IntoResponse {
    info!("PUT /api/quests/{} - request: {:?}", quest_id, request);

    match state.quest_service.update_quest(&quest_id, request).await {
        Ok(quest) => (StatusCode::OK, Json(quest)).into_response(),
        Err(e) => error_response("Failed to update quest", e),
    }
}

pub async fn delete_quest(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/quests/{}", quest_id);

    match state.quest_service.delete_quest(&quest_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete quest", e),
    }
}

pub async fn get_quest_stats(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/quests/stats");

    match state.quest_service.quest_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response("Failed to compute quest stats", e),
    }
}

pub async fn get_overdue_quests(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/quests/overdue");

    match state.quest_service.get_overdue_quests().await {
        Ok(quests) => (StatusCode::OK, Json(quests)).into_response(),
        Err(e) => error_response("Failed to list overdue quests", e),
    }
}

/// Complete a quest; recurring quests count toward their period target
pub async fn complete_quest(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/quests/{}/complete", quest_id);

    match state.quest_service.complete_quest(&quest_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response("Failed to complete quest", e),
    }
}

pub async fn complete_recurring_quest(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/quests/{}/complete-recurring", quest_id);

    match state.quest_service.complete_recurring_quest(&quest_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response("Failed to complete recurring quest", e),
    }
}

pub async fn get_recurring_progress(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/quests/{}/progress", quest_id);

    match state.quest_service.get_recurring_progress(&quest_id).await {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(e) => error_response("Failed to get recurring progress", e),
    }
}

pub async fn list_quest_subtasks(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/quests/{}/subtasks", quest_id);

    match state.subtask_service.list_subtasks(&quest_id).await {
        Ok(subtasks) => (StatusCode::OK, Json(subtasks)).into_response(),
        Err(e) => error_response("Failed to list subtasks", e),
    }
}

pub async fn reset_recurring_quests(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/quests/recurring/reset");

    match state.quest_service.check_and_reset_recurring_quests().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response("Failed to reset recurring quests", e),
    }
}
