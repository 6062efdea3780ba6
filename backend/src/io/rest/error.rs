//! Translation of domain errors into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::domain::DomainError;

pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::InvariantViolation(_) => StatusCode::CONFLICT,
        DomainError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log a failed operation and build its `{ "error": message }` response
pub fn error_response(context: &str, error: DomainError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        error!("{}: {:#}", context, error);
    } else {
        warn!("{}: {}", context, error);
    }
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
