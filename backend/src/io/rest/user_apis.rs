//! # REST API for the User and Dashboard

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use shared::UpdateUserSettingsRequest;
use tracing::info;

use super::error::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_user))
        .route("/settings", put(update_settings))
}

pub async fn get_user(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/user");

    match state.user_service.get_user().await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => error_response("Failed to get user", e),
    }
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateUserSettingsRequest>,
) -> impl IntoResponse {
    info!("PUT /api/user/settings - request: {:?}", request);

    match state.user_service.update_settings(request).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => error_response("Failed to update user settings", e),
    }
}

pub async fn get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/dashboard");

    match state.user_service.dashboard().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response("Failed to build dashboard", e),
    }
}
