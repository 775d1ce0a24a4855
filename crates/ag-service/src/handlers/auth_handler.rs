//! Login and logout handlers.

use crate::errors::AgError;
use crate::middleware::auth::BearerToken;
use crate::models::{LoginRequest, LoginResponse};
use crate::observability::metrics;
use crate::routes::AppState;
use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tracing::info;

/// Handle a login attempt.
///
/// POST /api/v1/auth/login
///
/// Verifies the user/pass pair against the directory and mints a bearer
/// token identifying the caller on subsequent requests.
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AgError> {
    let authenticated = state
        .directory
        .find(&payload.user)
        .is_some_and(|user| user.password == payload.pass);

    if !authenticated {
        info!(target: "ag.handlers.auth", user = %payload.user, "Login rejected");
        metrics::record_login("rejected");
        return Err(AgError::InvalidCredentials);
    }

    let token = state.logins.create(&payload.user).await;
    info!(target: "ag.handlers.auth", user = %payload.user, "Login accepted");
    metrics::record_login("accepted");

    Ok(Json(LoginResponse { token }))
}

/// Handle logout.
///
/// POST /api/v1/auth/logout
///
/// Revokes the bearer token the request authenticated with.
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<BearerToken>,
) -> Result<StatusCode, AgError> {
    if let Some(identity) = state.logins.revoke(&token.0).await {
        info!(target: "ag.handlers.auth", user = identity.username(), "Logged out");
    }

    Ok(StatusCode::OK)
}
