//! Error types for the report server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::job::JobError;

/// Shown to clients for any failed job
pub const JOB_FAILED_MESSAGE: &str = "Error updating pages or generating PDF";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Job(#[from] JobError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: &'static str,
    error: String,
    stage: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, stage) = match &self {
            ApiError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "Invalid request body", "request")
            }
            ApiError::Job(e) => {
                tracing::error!("Error generating PDF ({} stage): {}", e.stage(), e);
                (StatusCode::INTERNAL_SERVER_ERROR, JOB_FAILED_MESSAGE, e.stage())
            }
        };

        let error = match self {
            ApiError::InvalidRequest(msg) => msg,
            ApiError::Job(e) => e.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            message,
            error,
            stage,
        };

        (status, Json(body)).into_response()
    }
}
