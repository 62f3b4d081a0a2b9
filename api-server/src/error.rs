//! Error handling

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pulse_core::CoreError;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(String),
    NotFound(String),
    /// Limit in MB
    PayloadTooLarge(usize),

    // Model errors
    ModelUnavailable(String),

    // Analysis errors
    CaptureError(String),
    AnalysisFailed(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PayloadTooLarge(mb) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("File too large. Maximum size is {}MB", mb),
            ),
            AppError::ModelUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::CaptureError(msg) => {
                tracing::warn!("Unreadable capture: {}", msg);
                (StatusCode::BAD_REQUEST, format!("Failed to read PCAP: {}", msg))
            }
            AppError::AnalysisFailed(msg) => {
                tracing::error!("Analysis failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Analysis failed: {}", msg))
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Capture(msg) => AppError::CaptureError(msg),
            CoreError::Schema(msg) => AppError::ValidationError(msg),
            e @ CoreError::FeatureMismatch { .. } => AppError::ValidationError(e.to_string()),
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("worker task failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let message = err
            .field_errors()
            .values()
            .flat_map(|errors| errors.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| err.to_string());
        AppError::ValidationError(message)
    }
}

/// Multipart read failures; body-limit hits become 413
pub fn multipart_error(err: MultipartError, limit_mb: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(limit_mb)
    } else {
        AppError::ValidationError(err.body_text())
    }
}
