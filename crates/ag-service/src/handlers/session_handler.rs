//! Connection token request and release handlers.

use crate::auth::Identity;
use crate::errors::AgError;
use crate::models::{ReleaseRequest, ReleaseResponse, TokenRequest, TokenResponse};
use crate::routes::AppState;
use axum::{extract::State, Extension, Json};
use std::sync::Arc;

/// Handle a connection token request for a named video call.
///
/// POST /api/v1/sessions/token
pub async fn handle_token_request(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AgError> {
    let token = state
        .gateway
        .request_token(&identity, &payload.session_name)
        .await?;

    Ok(Json(TokenResponse { token }))
}

/// Handle a departing participant returning its token.
///
/// POST /api/v1/sessions/release
pub async fn handle_token_release(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<ReleaseRequest>,
) -> Result<Json<ReleaseResponse>, AgError> {
    let outcome = state
        .gateway
        .release_token(&identity, &payload.session_name, &payload.token)
        .await?;

    Ok(Json(ReleaseResponse { outcome }))
}
