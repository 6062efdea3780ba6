//! # REST API for the Reward Shop

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{CreateRewardRequest, RewardListRequest};
use tracing::info;

use super::error::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rewards).post(create_reward))
        .route("/:reward_id", get(get_reward).delete(delete_reward))
        .route("/:reward_id/purchase", post(purchase_reward))
}

pub async fn list_rewards(
    State(state): State<AppState>,
    Query(request): Query<RewardListRequest>,
) -> impl IntoResponse {
    info!("GET /api/rewards - request: {:?}", request);

    match state.reward_shop_service.list_rewards(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to list rewards", e),
    }
}

pub async fn create_reward(
    State(state): State<AppState>,
    Json(request): Json<CreateRewardRequest>,
) -> impl IntoResponse {
    info!("POST /api/rewards - request: {:?}", request);

    match state.reward_shop_service.create_reward(request).await {
        Ok(reward) => (StatusCode::CREATED, Json(reward)).into_response(),
        Err(e) => error_response("Failed to create reward", e),
    }
}

pub async fn get_reward(
    State(state): State<AppState>,
    Path(reward_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/rewards/{}", reward_id);

    match state.reward_shop_service.get_reward(&reward_id).await {
        Ok(reward) => (StatusCode::OK, Json(reward)).into_response(),
        Err(e) => error_response("Failed to get reward", e),
    }
}

pub async fn delete_reward(
    State(state): State<AppState>,
    Path(reward_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/rewards/{}", reward_id);

    match state.reward_shop_service.delete_reward(&reward_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete reward", e),
    }
}

/// Spend currency on a reward; 402 when the balance is too low
pub async fn purchase_reward(
    State(state): State<AppState>,
    Path(reward_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/rewards/{}/purchase", reward_id);

    match state.reward_shop_service.purchase_reward(&reward_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to purchase reward", e),
    }
}
