//! Authentication middleware for protected routes.
//!
//! Extracts the bearer token from the Authorization header, resolves it
//! against the live login sessions, and injects the resulting
//! `Identity` into request extensions for downstream handlers.

use crate::auth::{require_identity, LoginSessions};
use crate::errors::AgError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Live login sessions.
    pub logins: Arc<LoginSessions>,
}

/// Raw bearer token the request authenticated with.
///
/// Stored alongside `Identity` so the logout handler can revoke it.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Extract the bearer token from the Authorization header.
fn extract_bearer_token(req: &Request) -> Result<&str, AgError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "ag.middleware.auth", "Missing Authorization header");
            AgError::NotAuthenticated
        })?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!(target: "ag.middleware.auth", "Invalid Authorization header format");
        AgError::NotAuthenticated
    })
}

/// Require a logged-in caller.
///
/// # Response
///
/// - Returns 401 Unauthorized if the token is missing or does not match
///   a live login
/// - Continues to the next handler with `Identity` and `BearerToken` in
///   extensions otherwise
pub async fn require_login(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AgError> {
    let token = extract_bearer_token(&req)?.to_string();

    let identity = require_identity(state.logins.resolve(&token).await)?;

    req.extensions_mut().insert(identity);
    req.extensions_mut().insert(BearerToken(token));

    Ok(next.run(req).await)
}
