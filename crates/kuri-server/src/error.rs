//! Error types for the Kuri server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kuri_registry::RegistryError;
use serde::Serialize;
use telegram_client::TelegramError;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0:#}")]
    Config(#[from] anyhow::Error),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Message has no sender")]
    NoSender,
}

impl AppError {
    /// Process exit code for a startup failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 10,
            AppError::Registry(_) => 11,
            AppError::Telegram(_) => 12,
            AppError::Io(_) => 13,
            AppError::NoSender => 1,
        }
    }
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

/// HTTP API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Message too long (max {max} characters)")]
    MessageTooLong { max: usize },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            ApiError::MessageTooLong { .. } => (StatusCode::BAD_REQUEST, "MESSAGE_TOO_LONG"),
            ApiError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
