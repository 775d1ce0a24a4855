//! The session/token registry.
//!
//! Single source of truth for which video calls are live and which
//! connection tokens are outstanding. The registry exclusively owns two
//! co-indexed maps keyed by session name: name → backend handle and
//! name → (token → role). A name is present in the handle map iff its
//! token set exists and is non-empty; both maps mutate together under
//! one lock.

use crate::errors::AgError;
use crate::models::{ReleaseOutcome, Role};
use crate::observability::metrics;
use crate::services::media_backend::{BackendError, BackendHandle, MediaBackend};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Paired lookups keyed by session name.
#[derive(Default)]
struct RegistryMaps {
    handles: HashMap<String, BackendHandle>,
    tokens: HashMap<String, HashMap<String, Role>>,
}

/// Owns the session/token maps and all mutation to them.
pub struct SessionRegistry {
    backend: Arc<dyn MediaBackend>,
    maps: Mutex<RegistryMaps>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            maps: Mutex::new(RegistryMaps::default()),
        }
    }

    /// Issue a connection token for `session_name`, creating the backend
    /// session on first use.
    ///
    /// If the backend reports the cached handle invalid, the stale entry
    /// is evicted from both maps and a fresh session is created
    /// transparently; the caller sees an error only if that retry fails
    /// too. Any other backend failure surfaces unchanged and commits no
    /// mutation.
    ///
    /// The registry lock is held across the whole check/evict/create
    /// sequence, so calls for the same name serialize and the paired
    /// maps never diverge.
    pub async fn acquire_token(
        &self,
        session_name: &str,
        role: Role,
        metadata: &serde_json::Value,
    ) -> Result<String, AgError> {
        let mut guard = self.maps.lock().await;
        let maps = &mut *guard;

        if let Some(handle) = maps.handles.get(session_name) {
            match self.backend.create_token(handle, role, metadata).await {
                Ok(token) => {
                    maps.tokens
                        .entry(session_name.to_string())
                        .or_default()
                        .insert(token.clone(), role);
                    metrics::record_token_issued("reused");
                    return Ok(token);
                }
                Err(BackendError::HandleInvalid) => {
                    // The session vanished upstream; drop the stale entry
                    // and continue as if the name had never been seen.
                    warn!(
                        target: "ag.registry",
                        session_name,
                        "Cached backend session is gone upstream, evicting and recreating"
                    );
                    maps.handles.remove(session_name);
                    maps.tokens.remove(session_name);
                    metrics::record_session_self_healed();
                }
                Err(e) => {
                    metrics::record_token_issued("backend_error");
                    return Err(e.into());
                }
            }
        }

        info!(target: "ag.registry", session_name, "Creating new backend session");

        let handle = match self.backend.create_session().await {
            Ok(handle) => handle,
            Err(e) => {
                metrics::record_token_issued("backend_error");
                return Err(e.into());
            }
        };

        let token = match self.backend.create_token(&handle, role, metadata).await {
            Ok(token) => token,
            Err(e) => {
                // The fresh upstream session stays unregistered; nothing
                // local to roll back.
                warn!(
                    target: "ag.registry",
                    session_name,
                    backend_session = handle.id(),
                    "Token creation failed after session creation, backend session left unregistered"
                );
                metrics::record_session_abandoned();
                metrics::record_token_issued("backend_error");
                return Err(e.into());
            }
        };

        maps.tokens.insert(
            session_name.to_string(),
            HashMap::from([(token.clone(), role)]),
        );
        maps.handles.insert(session_name.to_string(), handle);
        metrics::record_session_created();
        metrics::record_token_issued("created");

        Ok(token)
    }

    /// Remove `token` from `session_name`'s token set, tearing the
    /// session down when the last token goes.
    pub async fn release_token(
        &self,
        session_name: &str,
        token: &str,
    ) -> Result<ReleaseOutcome, AgError> {
        let mut guard = self.maps.lock().await;
        let maps = &mut *guard;

        let Some(tokens) = maps.tokens.get_mut(session_name) else {
            metrics::record_token_released("session_not_found");
            return Err(AgError::SessionNotFound(session_name.to_string()));
        };

        if tokens.remove(token).is_none() {
            metrics::record_token_released("token_not_found");
            return Err(AgError::TokenNotFound(session_name.to_string()));
        }

        if tokens.is_empty() {
            maps.tokens.remove(session_name);
            maps.handles.remove(session_name);
            info!(target: "ag.registry", session_name, "Last participant left, session torn down");
            metrics::record_token_released("closed");
            return Ok(ReleaseOutcome::ReleasedAndClosed);
        }

        metrics::record_token_released("released");
        Ok(ReleaseOutcome::Released)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::services::media_backend::mock::MockMediaBackend;
    use serde_json::json;

    fn new_registry() -> (SessionRegistry, Arc<MockMediaBackend>) {
        let backend = Arc::new(MockMediaBackend::new());
        (SessionRegistry::new(backend.clone()), backend)
    }

    /// A name is present in the handle map iff its token set exists and
    /// is non-empty.
    async fn assert_maps_consistent(registry: &SessionRegistry) {
        let maps = registry.maps.lock().await;
        assert_eq!(maps.handles.len(), maps.tokens.len());
        for (name, tokens) in &maps.tokens {
            assert!(
                maps.handles.contains_key(name),
                "token set without handle: {name}"
            );
            assert!(!tokens.is_empty(), "empty token set left behind: {name}");
        }
    }

    #[tokio::test]
    async fn test_first_request_creates_session_and_registers_token() {
        let (registry, backend) = new_registry();

        let token = registry
            .acquire_token("room-42", Role::Publisher, &json!({}))
            .await
            .unwrap();

        assert_eq!(token, "tok-1");
        assert_eq!(backend.sessions_created(), 1);

        let maps = registry.maps.lock().await;
        assert_eq!(maps.handles.get("room-42").map(|h| h.id()), Some("sess-1"));
        assert_eq!(
            maps.tokens.get("room-42").and_then(|t| t.get("tok-1")),
            Some(&Role::Publisher)
        );
    }

    #[tokio::test]
    async fn test_second_request_reuses_backend_session() {
        let (registry, backend) = new_registry();

        registry
            .acquire_token("room-42", Role::Publisher, &json!({}))
            .await
            .unwrap();
        let token = registry
            .acquire_token("room-42", Role::Subscriber, &json!({}))
            .await
            .unwrap();

        assert_eq!(token, "tok-2");
        assert_eq!(backend.sessions_created(), 1);

        // Both tokens went to the same backend session, each with its
        // caller's role
        let calls = backend.token_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.backend_session == "sess-1"));
        assert_eq!(calls[0].role, Role::Publisher);
        assert_eq!(calls[1].role, Role::Subscriber);

        assert_maps_consistent(&registry).await;
    }

    #[tokio::test]
    async fn test_release_with_others_outstanding_keeps_session_live() {
        let (registry, _backend) = new_registry();

        let t1 = registry
            .acquire_token("room-42", Role::Publisher, &json!({}))
            .await
            .unwrap();
        let t2 = registry
            .acquire_token("room-42", Role::Subscriber, &json!({}))
            .await
            .unwrap();

        let outcome = registry.release_token("room-42", &t1).await.unwrap();
        assert_eq!(outcome, ReleaseOutcome::Released);

        let maps = registry.maps.lock().await;
        assert_eq!(maps.handles.get("room-42").map(|h| h.id()), Some("sess-1"));
        assert_eq!(
            maps.tokens.get("room-42").and_then(|t| t.get(&t2)),
            Some(&Role::Subscriber)
        );
        assert_eq!(maps.tokens.get("room-42").map(HashMap::len), Some(1));
    }

    #[tokio::test]
    async fn test_releasing_last_token_tears_session_down() {
        let (registry, backend) = new_registry();

        let token = registry
            .acquire_token("room-42", Role::Publisher, &json!({}))
            .await
            .unwrap();

        let outcome = registry.release_token("room-42", &token).await.unwrap();
        assert_eq!(outcome, ReleaseOutcome::ReleasedAndClosed);

        {
            let maps = registry.maps.lock().await;
            assert!(maps.handles.is_empty());
            assert!(maps.tokens.is_empty());
        }

        // A new request for the same name gets a brand-new backend
        // session, not the old handle
        registry
            .acquire_token("room-42", Role::Publisher, &json!({}))
            .await
            .unwrap();
        assert_eq!(backend.sessions_created(), 2);

        let maps = registry.maps.lock().await;
        assert_eq!(maps.handles.get("room-42").map(|h| h.id()), Some("sess-2"));
    }

    #[tokio::test]
    async fn test_release_unknown_session_is_session_not_found() {
        let (registry, _backend) = new_registry();

        let err = registry.release_token("nowhere", "tok-1").await.unwrap_err();
        assert!(matches!(err, AgError::SessionNotFound(name) if name == "nowhere"));
    }

    #[tokio::test]
    async fn test_release_token_from_other_session_is_token_not_found() {
        let (registry, _backend) = new_registry();

        registry
            .acquire_token("room-a", Role::Publisher, &json!({}))
            .await
            .unwrap();
        let token_b = registry
            .acquire_token("room-b", Role::Publisher, &json!({}))
            .await
            .unwrap();

        // room-a exists but token_b belongs to room-b
        let err = registry.release_token("room-a", &token_b).await.unwrap_err();
        assert!(matches!(err, AgError::TokenNotFound(name) if name == "room-a"));

        // token_b is untouched and still releasable from its own session
        let outcome = registry.release_token("room-b", &token_b).await.unwrap();
        assert_eq!(outcome, ReleaseOutcome::ReleasedAndClosed);
        assert_maps_consistent(&registry).await;
    }

    #[tokio::test]
    async fn test_handle_invalid_evicts_and_recreates_transparently() {
        let (registry, backend) = new_registry();

        registry
            .acquire_token("room-42", Role::Publisher, &json!({}))
            .await
            .unwrap();

        // The backend forgets the session; the next acquire must succeed
        // anyway via a fresh session
        backend.fail_next_create_token(BackendError::HandleInvalid);
        let token = registry
            .acquire_token("room-42", Role::Subscriber, &json!({}))
            .await
            .unwrap();

        assert_eq!(backend.sessions_created(), 2);

        let maps = registry.maps.lock().await;
        assert_eq!(maps.handles.get("room-42").map(|h| h.id()), Some("sess-2"));
        // The evicted entry's tokens went with it; only the new token
        // remains
        let tokens = maps.tokens.get("room-42").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens.get(&token), Some(&Role::Subscriber));
    }

    #[tokio::test]
    async fn test_other_backend_error_on_existing_session_mutates_nothing() {
        let (registry, backend) = new_registry();

        let t1 = registry
            .acquire_token("room-42", Role::Publisher, &json!({}))
            .await
            .unwrap();

        backend.fail_next_create_token(BackendError::Upstream(500));
        let err = registry
            .acquire_token("room-42", Role::Subscriber, &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, AgError::Backend(BackendError::Upstream(500))));
        // No self-heal: the entry and its one token are exactly as before
        assert_eq!(backend.sessions_created(), 1);
        let maps = registry.maps.lock().await;
        assert_eq!(maps.handles.get("room-42").map(|h| h.id()), Some("sess-1"));
        assert_eq!(
            maps.tokens.get("room-42").and_then(|t| t.get(&t1)),
            Some(&Role::Publisher)
        );
        assert_eq!(maps.tokens.get("room-42").map(HashMap::len), Some(1));
    }

    #[tokio::test]
    async fn test_session_creation_failure_leaves_no_entry() {
        let (registry, backend) = new_registry();

        backend.fail_next_create_session(BackendError::Upstream(503));
        let err = registry
            .acquire_token("room-42", Role::Publisher, &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, AgError::Backend(BackendError::Upstream(503))));
        let maps = registry.maps.lock().await;
        assert!(maps.handles.is_empty());
        assert!(maps.tokens.is_empty());
    }

    #[tokio::test]
    async fn test_token_failure_on_new_session_leaves_no_partial_entry() {
        let (registry, backend) = new_registry();

        backend.fail_next_create_token(BackendError::Upstream(500));
        let err = registry
            .acquire_token("room-42", Role::Publisher, &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, AgError::Backend(BackendError::Upstream(500))));

        // The upstream session was created but never registered: no
        // orphaned handle, no token set
        assert_eq!(backend.sessions_created(), 1);
        let maps = registry.maps.lock().await;
        assert!(maps.handles.is_empty());
        assert!(maps.tokens.is_empty());
    }

    #[tokio::test]
    async fn test_double_release_of_same_token_fails_second_time() {
        let (registry, _backend) = new_registry();

        registry
            .acquire_token("room-42", Role::Publisher, &json!({}))
            .await
            .unwrap();
        let t2 = registry
            .acquire_token("room-42", Role::Subscriber, &json!({}))
            .await
            .unwrap();

        assert_eq!(
            registry.release_token("room-42", &t2).await.unwrap(),
            ReleaseOutcome::Released
        );
        let err = registry.release_token("room-42", &t2).await.unwrap_err();
        assert!(matches!(err, AgError::TokenNotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_acquires_on_unseen_name_register_one_handle() {
        let backend = Arc::new(MockMediaBackend::new());
        let registry = Arc::new(SessionRegistry::new(
            backend.clone() as Arc<dyn MediaBackend>
        ));

        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = registry.clone();
            let role = if i % 2 == 0 {
                Role::Publisher
            } else {
                Role::Subscriber
            };
            handles.push(tokio::spawn(async move {
                registry.acquire_token("room-42", role, &json!({})).await
            }));
        }

        let tokens: Vec<String> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        // Exactly one backend session ended up registered under the name
        assert_eq!(backend.sessions_created(), 1);

        let maps = registry.maps.lock().await;
        assert_eq!(maps.handles.len(), 1);
        let registered = maps.tokens.get("room-42").unwrap();
        assert_eq!(registered.len(), 8);
        for token in &tokens {
            assert!(registered.contains_key(token));
        }
    }

    #[tokio::test]
    async fn test_concurrent_acquire_release_keeps_maps_consistent() {
        let backend = Arc::new(MockMediaBackend::new());
        let registry = Arc::new(SessionRegistry::new(
            backend.clone() as Arc<dyn MediaBackend>
        ));

        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = registry.clone();
            let name = if i % 2 == 0 { "room-even" } else { "room-odd" };
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    let token = registry
                        .acquire_token(name, Role::Publisher, &json!({}))
                        .await
                        .unwrap();
                    registry.release_token(name, &token).await.unwrap();
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        // Every participant left; both maps must be empty and agree
        assert_maps_consistent(&registry).await;
        let maps = registry.maps.lock().await;
        assert!(maps.handles.is_empty());
        assert!(maps.tokens.is_empty());
    }

    #[tokio::test]
    async fn test_scenario_two_participants_full_lifecycle() {
        let (registry, backend) = new_registry();

        // publisher1 requests a token for room-42: new session + token
        let t1 = registry
            .acquire_token(
                "room-42",
                Role::Publisher,
                &json!({"serverData": "publisher1"}),
            )
            .await
            .unwrap();
        // subscriber joins the same room: same backend session
        let t2 = registry
            .acquire_token(
                "room-42",
                Role::Subscriber,
                &json!({"serverData": "subscriber"}),
            )
            .await
            .unwrap();

        assert_eq!(backend.sessions_created(), 1);
        {
            let maps = registry.maps.lock().await;
            let tokens = maps.tokens.get("room-42").unwrap();
            assert_eq!(tokens.get(&t1), Some(&Role::Publisher));
            assert_eq!(tokens.get(&t2), Some(&Role::Subscriber));
        }

        // publisher leaves; subscriber keeps the session alive
        assert_eq!(
            registry.release_token("room-42", &t1).await.unwrap(),
            ReleaseOutcome::Released
        );
        {
            let maps = registry.maps.lock().await;
            assert_eq!(maps.handles.get("room-42").map(|h| h.id()), Some("sess-1"));
            assert_eq!(maps.tokens.get("room-42").map(HashMap::len), Some(1));
        }

        // last participant leaves; the entry disappears from both maps
        assert_eq!(
            registry.release_token("room-42", &t2).await.unwrap(),
            ReleaseOutcome::ReleasedAndClosed
        );
        let maps = registry.maps.lock().await;
        assert!(maps.handles.is_empty());
        assert!(maps.tokens.is_empty());
    }
}
