//! # REST API for Life Areas

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use shared::{CreateLifeAreaRequest, UpdateLifeAreaRequest};
use tracing::info;

use super::error::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_life_areas).post(create_life_area))
        .route(
            "/:life_area_id",
            get(get_life_area).put(update_life_area).delete(delete_life_area),
        )
        .route("/:life_area_id/progress", get(get_level_progress))
}

pub async fn list_life_areas(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/life-areas");

    match state.life_area_service.list_life_areas().await {
        Ok(areas) => (StatusCode::OK, Json(areas)).into_response(),
        Err(e) => error_response("Failed to list life areas", e),
    }
}

pub async fn create_life_area(
    State(state): State<AppState>,
    Json(request): Json<CreateLifeAreaRequest>,
) -> impl IntoResponse {
    info!("POST /api/life-areas - request: {:?}", request);

    match state.life_area_service.create_life_area(request).await {
        Ok(area) => (StatusCode::CREATED, Json(area)).into_response(),
        Err(e) => error_response("Failed to create life area", e),
    }
}

pub async fn get_life_area(
    State(state): State<AppState>,
    Path(life_area_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/life-areas/{}", life_area_id);

    match state.life_area_service.get_life_area(&life_area_id).await {
        Ok(area) => (StatusCode::OK, Json(area)).into_response(),
        Err(e) => error_response("Failed to get life area", e),
    }
}

pub async fn update_life_area(
    State(state): State<AppState>,
    Path(life_area_id): Path<String>,
    Json(request): Json<UpdateLifeAreaRequest>,
) -> impl IntoResponse {
    info!("PUT /api/life-areas/{} - request: {:?}", life_area_id, request);

    match state.life_area_service.update_life_area(&life_area_id, request).await {
        Ok(area) => (StatusCode::OK, Json(area)).into_response(),
        Err(e) => error_response("Failed to update life area", e),
    }
}

/// Delete a custom life area; defaults and areas in use are refused with 409
pub async fn delete_life_area(
    State(state): State<AppState>,
    Path(life_area_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/life-areas/{}", life_area_id);

    match state.life_area_service.delete_life_area(&life_area_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete life area", e),
    }
}

pub async fn get_level_progress(
    State(state): State<AppState>,
    Path(life_area_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/life-areas/{}/progress", life_area_id);

    match state.life_area_service.calculate_level_progress(&life_area_id).await {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(e) => error_response("Failed to calculate level progress", e),
    }
}
