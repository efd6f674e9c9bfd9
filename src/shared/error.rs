//! Application Error Types
//!
//! Centralized error handling with Axum integration, plus the error taxonomy
//! of the real-time gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, 10001, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, 10002, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, 10003, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, 10004, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, 10007, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
        };

        let body = ErrorResponse { code, message };

        (status, Json(body)).into_response()
    }
}

/// Failure of a single gateway operation.
///
/// Every variant is terminal for the event that triggered it and is reported
/// to the originating connection only.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("channel {0} not found")]
    ChannelNotFound(i64),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("persistence failure while {action}")]
    Persistence {
        action: &'static str,
        #[source]
        source: AppError,
    },

    #[error("session is no longer registered")]
    SessionClosed,
}

impl GatewayError {
    pub fn persistence(action: &'static str) -> impl FnOnce(AppError) -> Self {
        move |source| GatewayError::Persistence { action, source }
    }

    /// Short human-readable reason sent in the `error` event.
    pub fn client_reason(&self) -> String {
        match self {
            GatewayError::ChannelNotFound(_) => "Channel not found.".into(),
            GatewayError::Forbidden(reason) => (*reason).to_string(),
            GatewayError::Invalid(reason) => reason.clone(),
            GatewayError::Persistence { action, .. } => format!("Error {}.", action),
            GatewayError::SessionClosed => "Session closed.".into(),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ChannelNotFound(_) => AppError::NotFound(err.client_reason()),
            GatewayError::Forbidden(reason) => AppError::Forbidden(reason.into()),
            GatewayError::Invalid(reason) => AppError::BadRequest(reason),
            GatewayError::Persistence { source, .. } => source,
            GatewayError::SessionClosed => AppError::Internal(err.to_string()),
        }
    }
}
