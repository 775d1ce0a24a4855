use crate::services::media_backend::BackendError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Access Gateway error type.
///
/// Every declined operation maps to one of these kinds; the HTTP
/// boundary reports the kind and a generic message, never upstream
/// handles or transport detail.
#[derive(Debug, Error)]
pub enum AgError {
    /// No identity is attached to the request.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Login failed: unknown user or password mismatch.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The authenticated identity has no directory entry.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// No live session is registered under the given name.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The token is not a member of the named session's token set.
    #[error("token not registered for session: {0}")]
    TokenNotFound(String),

    /// The media backend declined or failed an operation.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AgError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AgError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                "NOT_AUTHENTICATED",
                "Authentication required".to_string(),
            ),
            AgError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "User/Pass incorrect".to_string(),
            ),
            AgError::UnknownUser(_) => (
                StatusCode::UNAUTHORIZED,
                "UNKNOWN_USER",
                "No directory entry for the authenticated user".to_string(),
            ),
            AgError::SessionNotFound(name) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                format!("No session named {name}"),
            ),
            AgError::TokenNotFound(name) => (
                StatusCode::NOT_FOUND,
                "TOKEN_NOT_FOUND",
                format!("Token is not registered for session {name}"),
            ),
            AgError::Backend(_) => (
                StatusCode::BAD_GATEWAY,
                "BACKEND_ERROR",
                "The media backend declined the operation".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
