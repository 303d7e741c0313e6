use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::database::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    AuthorizationDenied(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request: {0}")]
    ValidationFailed(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Event is full: {0}")]
    EventFull(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            Error::Validation(_) | Error::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Error::AlreadyExists(_) | Error::AlreadyRegistered(_) | Error::EventFull(_) => {
                StatusCode::CONFLICT
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Config(_) | Error::Storage(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code so clients can render a specific message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::Unauthorized(_) => "unauthorized",
            Error::AuthorizationDenied(_) => "permission_denied",
            Error::Validation(_) | Error::ValidationFailed(_) => "validation_failed",
            Error::AlreadyExists(_) => "already_exists",
            Error::AlreadyRegistered(_) => "already_registered",
            Error::EventFull(_) => "event_full",
            Error::NotFound(_) => "not_found",
            Error::Storage(_) => "storage_failure",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error_message = match &self {
            Error::Unauthorized(msg)
            | Error::AuthorizationDenied(msg)
            | Error::ValidationFailed(msg)
            | Error::AlreadyExists(msg)
            | Error::AlreadyRegistered(msg)
            | Error::EventFull(msg)
            | Error::NotFound(msg) => msg.clone(),
            Error::Validation(err) => err.to_string(),
            Error::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                "An unexpected error occurred".to_string()
            }
            Error::Config(_) | Error::Internal(_) => {
                tracing::error!(error = %self, "internal failure");
                "An unexpected error occurred".to_string()
            }
        };

        let body = Json(json!({ "error": error_message, "code": self.code() }));
        (status, body).into_response()
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { constraint } => {
                Error::AlreadyExists(format!("duplicate value violates {}", constraint))
            }
            other => Error::Storage(other),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::from(StoreError::from(err))
    }
}
