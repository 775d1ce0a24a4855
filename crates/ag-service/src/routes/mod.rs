//! HTTP routes for the Access Gateway.
//!
//! Defines the Axum router and application state.

use crate::auth::LoginSessions;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{require_login, AuthState};
use crate::repositories::UserDirectory;
use crate::services::AccessGateway;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Read-only user directory.
    pub directory: Arc<UserDirectory>,

    /// Live login sessions.
    pub logins: Arc<LoginSessions>,

    /// Orchestration over the directory and the session registry.
    pub gateway: Arc<AccessGateway>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK") - public, unversioned
/// - `/ready` - Readiness probe - public, unversioned
/// - `/metrics` - Prometheus metrics endpoint - public, unversioned
/// - `POST /api/v1/auth/login` - Login - public
/// - `POST /api/v1/auth/logout` - Logout - requires authentication
/// - `POST /api/v1/sessions/token` - Request a connection token - requires authentication
/// - `POST /api/v1/sessions/release` - Return a connection token - requires authentication
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        logins: state.logins.clone(),
    });

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/auth/login", post(handlers::handle_login))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/api/v1/auth/logout", post(handlers::handle_logout))
        .route("/api/v1/sessions/token", post(handlers::handle_token_request))
        .route(
            "/api/v1/sessions/release",
            post(handlers::handle_token_release),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, require_login))
        .with_state(state);

    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
