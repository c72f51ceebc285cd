//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use courier_rooms::StoreError;
use courier_users::{DirectoryError, TokenError};

/// Gateway error types.
///
/// The first three variants are authentication failures and tear the
/// connection down; everything else is scoped to the operation that
/// produced it.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unknown subject: {0}")]
    UnknownSubject(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable machine-readable tag carried on wire error events.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::MissingCredentials => "missing",
            GatewayError::InvalidCredentials(_) => "invalid",
            GatewayError::UnknownSubject(_) => "unknown-subject",
            GatewayError::Validation(_) => "validation",
            GatewayError::Storage(_) => "storage",
            GatewayError::NotFound(_) => "not-found",
            GatewayError::Database(_) => "database",
            GatewayError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingCredentials
            | GatewayError::InvalidCredentials(_)
            | GatewayError::UnknownSubject(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Storage(_) | GatewayError::Database(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<StoreError> for GatewayError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::RoomNotFound { .. }
            | StoreError::UserNotFound { .. }
            | StoreError::MessageNotFound { .. } => GatewayError::NotFound(error.to_string()),
            StoreError::Validation { message } => GatewayError::Validation(message),
            StoreError::Storage { message } => GatewayError::Storage(message),
            StoreError::Database(e) => GatewayError::Database(e.to_string()),
            StoreError::Internal { message } => GatewayError::Internal(message),
        }
    }
}

impl From<DirectoryError> for GatewayError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::UserNotFound => GatewayError::NotFound("User not found".to_string()),
            DirectoryError::UserAlreadyExists | DirectoryError::EmailAlreadyExists => {
                GatewayError::Validation(error.to_string())
            }
            DirectoryError::DatabaseError(msg) => GatewayError::Database(msg),
        }
    }
}

impl From<TokenError> for GatewayError {
    fn from(error: TokenError) -> Self {
        GatewayError::InvalidCredentials(error.to_string())
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(error: sqlx::Error) -> Self {
        GatewayError::Database(error.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::Internal(format!("JSON serialization error: {}", error))
    }
}
