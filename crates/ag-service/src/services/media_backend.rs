//! Client interface to the media conferencing backend.
//!
//! The backend owns session and token lifecycles; this module exposes
//! the two operations the gateway needs behind the [`MediaBackend`]
//! trait so tests can substitute a scripted implementation.

use crate::models::Role;
use crate::observability::metrics;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;
use thiserror::Error;
use tracing::warn;

/// Username presented with the shared secret on backend API calls.
const BACKEND_API_USER: &str = "app";

/// Opaque reference to a session object owned by the media backend.
///
/// Not `Clone`: the registry keeps the sole reference and drops it when
/// the session is torn down.
#[derive(Debug, PartialEq, Eq)]
pub struct BackendHandle(String);

impl BackendHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Backend-side identifier for this session.
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Errors reported by the media backend.
///
/// `HandleInvalid` is the one kind the registry recovers from locally
/// (the upstream session vanished); everything else propagates to the
/// caller.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The referenced session no longer exists upstream.
    #[error("backend session no longer valid")]
    HandleInvalid,

    /// The request never produced a usable response.
    #[error("media backend request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("media backend returned status {0}")]
    Upstream(u16),
}

/// Operations the gateway needs from the media backend.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Create a new conferencing session and return its handle.
    async fn create_session(&self) -> Result<BackendHandle, BackendError>;

    /// Create a connection token scoped to `handle`, carrying `role` and
    /// opaque `metadata` passed through to the other participants.
    async fn create_token(
        &self,
        handle: &BackendHandle,
        role: Role,
        metadata: &serde_json::Value,
    ) -> Result<String, BackendError>;
}

/// REST client for the media backend.
///
/// Authenticates every call with the backend's shared secret over HTTP
/// basic auth.
pub struct HttpMediaBackend {
    http: reqwest::Client,
    base_url: String,
    secret: String,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreateConnectionResponse {
    token: String,
}

impl HttpMediaBackend {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl MediaBackend for HttpMediaBackend {
    async fn create_session(&self) -> Result<BackendHandle, BackendError> {
        let url = format!("{}/sessions", self.base_url);
        let start = Instant::now();

        let response = self
            .http
            .post(&url)
            .basic_auth(BACKEND_API_USER, Some(&self.secret))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        metrics::record_backend_request("create_session", start.elapsed());

        let status = response.status();
        if !status.is_success() {
            warn!(
                target: "ag.media_backend",
                %status,
                "Session creation rejected by media backend"
            );
            return Err(BackendError::Upstream(status.as_u16()));
        }

        let body: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(BackendHandle::new(body.id))
    }

    async fn create_token(
        &self,
        handle: &BackendHandle,
        role: Role,
        metadata: &serde_json::Value,
    ) -> Result<String, BackendError> {
        let url = format!("{}/sessions/{}/connections", self.base_url, handle.id());
        let start = Instant::now();

        let response = self
            .http
            .post(&url)
            .basic_auth(BACKEND_API_USER, Some(&self.secret))
            .json(&serde_json::json!({
                "type": "WEBRTC",
                "role": role.as_str(),
                "data": metadata.to_string(),
            }))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        metrics::record_backend_request("create_token", start.elapsed());

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            // The session vanished upstream; the registry treats this as
            // a stale cache entry, not a failure.
            return Err(BackendError::HandleInvalid);
        }
        if !status.is_success() {
            warn!(
                target: "ag.media_backend",
                %status,
                backend_session = handle.id(),
                "Token creation rejected by media backend"
            );
            return Err(BackendError::Upstream(status.as_u16()));
        }

        let body: CreateConnectionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(body.token)
    }
}

pub mod mock {
    //! Scripted in-memory media backend for tests.

    use super::{BackendError, BackendHandle, MediaBackend};
    use crate::models::Role;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Mutex, PoisonError};

    /// A recorded `create_token` call.
    #[derive(Debug, Clone)]
    pub struct TokenCall {
        pub backend_session: String,
        pub role: Role,
        pub metadata: serde_json::Value,
    }

    /// In-memory [`MediaBackend`] with scriptable failures.
    ///
    /// Backend sessions and tokens get sequential ids (`sess-1`,
    /// `tok-1`, ...) so tests can assert on exact values.
    #[derive(Default)]
    pub struct MockMediaBackend {
        session_seq: AtomicU64,
        token_seq: AtomicU64,
        session_failures: Mutex<VecDeque<BackendError>>,
        token_failures: Mutex<VecDeque<BackendError>>,
        token_calls: Mutex<Vec<TokenCall>>,
    }

    impl MockMediaBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the next `create_session` call with `err`.
        pub fn fail_next_create_session(&self, err: BackendError) {
            self.session_failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(err);
        }

        /// Fail the next `create_token` call with `err`.
        pub fn fail_next_create_token(&self, err: BackendError) {
            self.token_failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(err);
        }

        /// Number of backend sessions created so far.
        pub fn sessions_created(&self) -> u64 {
            self.session_seq.load(Ordering::SeqCst)
        }

        /// Every `create_token` call that reached the backend.
        pub fn token_calls(&self) -> Vec<TokenCall> {
            self.token_calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl MediaBackend for MockMediaBackend {
        async fn create_session(&self) -> Result<BackendHandle, BackendError> {
            if let Some(err) = self
                .session_failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
            {
                return Err(err);
            }

            let n = self.session_seq.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(BackendHandle::new(format!("sess-{n}")))
        }

        async fn create_token(
            &self,
            handle: &BackendHandle,
            role: Role,
            metadata: &serde_json::Value,
        ) -> Result<String, BackendError> {
            if let Some(err) = self
                .token_failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
            {
                return Err(err);
            }

            let n = self.token_seq.fetch_add(1, Ordering::SeqCst) + 1;
            let token = format!("tok-{n}");

            self.token_calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(TokenCall {
                    backend_session: handle.id().to_string(),
                    role,
                    metadata: metadata.clone(),
                });

            Ok(token)
        }
    }
}
