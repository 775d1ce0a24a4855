//! Access Gateway models.
//!
//! Contains data types used across the gateway service.

use serde::{Deserialize, Serialize};

/// Connection capability class assigned per user and carried into each
/// issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// May publish media into a call.
    Publisher,

    /// May only receive media.
    Subscriber,
}

impl Role {
    /// Returns the wire name used by the media backend API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Publisher => "PUBLISHER",
            Role::Subscriber => "SUBSCRIBER",
        }
    }
}

/// A user record owned by the directory.
#[derive(Debug, Clone)]
pub struct User {
    pub name: String,
    pub password: String,
    pub role: Role,
}

/// Result of removing a token from a session's token set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseOutcome {
    /// Other tokens remain outstanding; the session stays live.
    Released,

    /// The last token was released and the session entry was torn down.
    ReleasedAndClosed,
}

/// Body of `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user: String,
    pub pass: String,
}

/// Response to a successful login: the bearer token identifying the
/// caller on subsequent requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Body of `POST /api/v1/sessions/token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub session_name: String,
}

/// Response carrying a freshly issued connection token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Body of `POST /api/v1/sessions/release`.
#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub session_name: String,
    pub token: String,
}

/// Response to a token release.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReleaseResponse {
    pub outcome: ReleaseOutcome,
}

/// Response body for the readiness probe.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
