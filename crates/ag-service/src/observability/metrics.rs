//! Metrics definitions for the Access Gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `ag_` prefix for Access Gateway
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion: every label value
//! is a literal fixed in code (`status`, `outcome`, `operation`). Session
//! names and usernames are never used as labels.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Media backend round-trips are network calls; sub-second to
        // multi-second buckets
        .set_buckets_for_metric(
            Matcher::Prefix("ag_backend_request".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set backend request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record a login attempt.
///
/// Metric: `ag_logins_total`
/// Labels: `status` (`accepted`, `rejected`)
pub fn record_login(status: &'static str) {
    counter!("ag_logins_total", "status" => status).increment(1);
}

/// Record a token issuance attempt.
///
/// Metric: `ag_tokens_issued_total`
/// Labels: `status` (`created`, `reused`, `backend_error`)
pub fn record_token_issued(status: &'static str) {
    counter!("ag_tokens_issued_total", "status" => status).increment(1);
}

/// Record a token release attempt.
///
/// Metric: `ag_tokens_released_total`
/// Labels: `outcome` (`released`, `closed`, `session_not_found`, `token_not_found`)
pub fn record_token_released(outcome: &'static str) {
    counter!("ag_tokens_released_total", "outcome" => outcome).increment(1);
}

/// Record creation of a backend session.
///
/// Metric: `ag_sessions_created_total`
pub fn record_session_created() {
    counter!("ag_sessions_created_total").increment(1);
}

/// Record eviction and transparent recreation of a stale session entry.
///
/// Metric: `ag_sessions_self_healed_total`
pub fn record_session_self_healed() {
    counter!("ag_sessions_self_healed_total").increment(1);
}

/// Record a backend session that was created but never registered
/// (token creation failed before the entry was committed).
///
/// Metric: `ag_sessions_abandoned_total`
pub fn record_session_abandoned() {
    counter!("ag_sessions_abandoned_total").increment(1);
}

/// Record a media backend round-trip.
///
/// Metric: `ag_backend_request_duration_seconds`
/// Labels: `operation` (`create_session`, `create_token`)
pub fn record_backend_request(operation: &'static str, duration: Duration) {
    histogram!("ag_backend_request_duration_seconds", "operation" => operation)
        .record(duration.as_secs_f64());
}
