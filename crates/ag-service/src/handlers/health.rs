//! Health check and metrics handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks the media backend dependency
//! - `/metrics`: Prometheus metrics render

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Returns a simple "OK" response to indicate the process is running.
/// Does NOT check any dependencies - failure means the process is
/// hung/deadlocked.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 if the service can handle traffic, 503 if not.
///
/// Error messages are intentionally generic; actual errors are logged
/// server-side.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // The media backend is only reached on demand; readiness verifies
    // the endpoint is configured, not that it answers
    if state.config.media_backend_url.is_empty() {
        tracing::warn!("Readiness check failed: media backend URL not configured");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                media_backend: Some("unconfigured"),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            media_backend: Some("configured"),
            error: None,
        }),
    )
}

/// Prometheus metrics endpoint handler.
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
