// src/error.rs

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::policy::DenyReason;
use crate::store::StoreError;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 500 as well, but raised by a store. Never retried here.
    StorageFailure(String),

    // 400 Bad Request. Input failed validation before any write.
    InvalidValue(String),

    // 401 Unauthorized
    Unauthenticated(String),

    // 403 Forbidden. Access policy said no.
    Forbidden(DenyReason),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (duplicate mark, duplicate username)
    Conflict(String),

    // 409 Conflict on the recipe name namespace
    DuplicateName(String),
}

impl AppError {
    /// Stable machine-readable kind, distinct for every denial and conflict.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InternalServerError(_) => "internal",
            AppError::StorageFailure(_) => "storage_failure",
            AppError::InvalidValue(_) => "invalid_value",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::Forbidden(reason) => reason.as_str(),
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::DuplicateName(_) => "duplicate_name",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::StorageFailure(msg) => {
                tracing::error!("Storage failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::InvalidValue(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(reason) => (StatusCode::FORBIDDEN, reason.message().to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::DuplicateName(name) => (
                StatusCode::CONFLICT,
                format!("A recipe named '{}' already exists", name),
            ),
        };
        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

/// Policy denials surface as 401, 403 or 409 depending on the reason.
impl From<DenyReason> for AppError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthenticated => {
                AppError::Unauthenticated("Authentication required".to_string())
            }
            DenyReason::AlreadyMarked => {
                AppError::Conflict("You have already marked this recipe".to_string())
            }
            other => AppError::Forbidden(other),
        }
    }
}

/// Fallback conversion for store errors that the caller did not translate.
/// Unique violations must be mapped at the call site, where the meaning is known.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Resource not found".to_string()),
            StoreError::UniqueViolation(constraint) => {
                AppError::Conflict(format!("Unique constraint '{}' violated", constraint))
            }
            StoreError::Backend(msg) => AppError::StorageFailure(msg),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::StorageFailure(err.to_string())
    }
}

/// Malformed or mistyped request bodies are validation failures.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidValue(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidValue(err.to_string())
    }
}
