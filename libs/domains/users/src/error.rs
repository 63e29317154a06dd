use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Missing permission: {0}")]
    Forbidden(&'static str),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Bulk pipeline error: {0}")]
    Pipeline(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            UserError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            UserError::Duplicate(key) => (
                StatusCode::CONFLICT,
                "duplicate",
                format!("Record with key '{}' already exists", key),
            ),
            UserError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid email or password".to_string(),
            ),
            UserError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            UserError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                "not_authenticated",
                "User not authenticated".to_string(),
            ),
            UserError::Forbidden(permission) => (
                StatusCode::FORBIDDEN,
                "forbidden",
                format!("Missing permission: {}", permission),
            ),
            UserError::PasswordHash(msg) => {
                tracing::error!("Password hash error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            UserError::Pipeline(msg) => {
                tracing::error!("Bulk pipeline error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "pipeline_error",
                    "Bulk operation failed".to_string(),
                )
            }
            UserError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "type": error_type,
                    "message": message
                }
            })),
        )
            .into_response()
    }
}
