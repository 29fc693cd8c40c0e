//! Common error types for the job service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::{JobId, JobStatus};

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Insufficient credits. Required: {required}, Available: {available}")]
    InsufficientCredits { required: u32, available: u32 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Job queue is full")]
    QueueFull,

    #[error("Job {job_id} cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Generation adapter error: {0}")]
    Adapter(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<u32>,
}

impl AppError {
    /// HTTP status, error type and machine-readable code for this error
    pub fn classify(&self) -> (StatusCode, &'static str, Option<&'static str>) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::Json(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", Some("invalid_json")),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, "adapter_error", None),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", Some("validation_failed")),
            AppError::InsufficientCredits { .. } => (StatusCode::PAYMENT_REQUIRED, "insufficient_credits", Some("insufficient_credits")),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found_error", Some("not_found")),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "authentication_error", Some("invalid_token")),
            AppError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error", Some("rate_limit_exceeded")),
            AppError::QueueFull => (StatusCode::SERVICE_UNAVAILABLE, "server_error", Some("queue_full")),
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, "conflict_error", Some("invalid_transition")),
            AppError::Adapter(_) => (StatusCode::BAD_GATEWAY, "adapter_error", None),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout_error", None),
            AppError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code) = self.classify();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let (required, available) = match &self {
            AppError::InsufficientCredits { required, available } => {
                (Some(*required), Some(*available))
            }
            _ => (None, None),
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                r#type: error_type.to_string(),
                code: code.map(|c| c.to_string()),
                required,
                available,
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
