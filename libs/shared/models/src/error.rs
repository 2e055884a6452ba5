use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, "Authentication required", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Resource not found", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error", msg),
        };

        tracing::error!("Error: {}: {}", status, details);

        let body = Json(json!({
            "error": error,
            "details": details
        }));

        (status, body).into_response()
    }
}
