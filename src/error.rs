//! Error types for LendHub server

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes carried in every error response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchRecord = 4,
    BadValue = 5,
    Duplicate = 6,
    OutOfStock = 7,
    UserSuspended = 8,
    DuplicateLoan = 9,
    AlreadyReturned = 10,
    InvalidCapacityChange = 11,
    InvalidTransition = 12,
    TransientFailure = 13,
    InvariantViolation = 14,
    EnrichmentFailure = 15,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Out of stock: {0}")]
    OutOfStock(String),

    #[error("User suspended: {0}")]
    UserSuspended(String),

    #[error("Duplicate loan: {0}")]
    DuplicateLoan(String),

    #[error("Already returned: {0}")]
    AlreadyReturned(String),

    #[error("Invalid capacity change: {0}")]
    InvalidCapacityChange(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Service temporarily unavailable: {0}")]
    Transient(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("record not found".to_string()),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => AppError::Transient(err.to_string()),
            sqlx::Error::Database(ref db) => {
                // 40001 = serialization_failure, safe to retry
                if db.code().as_deref() == Some("40001") {
                    AppError::Transient(err.to_string())
                } else if matches!(db.kind(), sqlx::error::ErrorKind::CheckViolation) {
                    AppError::Invariant(err.to_string())
                } else {
                    AppError::Database(err)
                }
            }
            _ => AppError::Database(err),
        }
    }
}

impl AppError {
    /// Whether a retry of the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchRecord, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::OutOfStock(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::OutOfStock, msg.clone())
            }
            AppError::UserSuspended(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::UserSuspended, msg.clone())
            }
            AppError::DuplicateLoan(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::DuplicateLoan, msg.clone())
            }
            AppError::AlreadyReturned(msg) => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyReturned, msg.clone())
            }
            AppError::InvalidCapacityChange(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidCapacityChange, msg.clone())
            }
            AppError::InvalidTransition(msg) => {
                (StatusCode::CONFLICT, ErrorCode::InvalidTransition, msg.clone())
            }
            AppError::Transient(msg) => {
                tracing::warn!("Transient failure: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::TransientFailure,
                    "Service temporarily unavailable, retry later".to_string(),
                )
            }
            AppError::Invariant(msg) => {
                tracing::error!("Invariant violation: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InvariantViolation,
                    "Internal consistency error".to_string(),
                )
            }
            AppError::Enrichment(msg) => {
                (StatusCode::BAD_GATEWAY, ErrorCode::EnrichmentFailure, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        if status == StatusCode::SERVICE_UNAVAILABLE {
            // Clients poll this header before retrying
            return (status, [(header::RETRY_AFTER, "1")], body).into_response();
        }

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
