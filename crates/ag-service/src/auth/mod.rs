//! Authentication boundary: login session storage and the identity gate
//! applied in front of the gateway operations.
//!
//! The login flow mints an opaque bearer token per successful login; the
//! rest of the service only ever asks "is there an authenticated
//! identity, and what is it".

use crate::errors::AgError;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The authenticated caller attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    pub fn username(&self) -> &str {
        &self.0
    }
}

/// Fails with `NotAuthenticated` when no identity is attached.
pub fn require_identity(identity: Option<Identity>) -> Result<Identity, AgError> {
    identity.ok_or(AgError::NotAuthenticated)
}

/// Live login sessions: opaque bearer token → username.
///
/// In-memory only; logins do not survive a restart.
#[derive(Default)]
pub struct LoginSessions {
    active: RwLock<HashMap<String, String>>,
}

impl LoginSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh login and return its bearer token.
    pub async fn create(&self, username: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.active
            .write()
            .await
            .insert(token.clone(), username.to_string());
        token
    }

    /// Resolve a bearer token to the identity it was minted for.
    pub async fn resolve(&self, token: &str) -> Option<Identity> {
        self.active
            .read()
            .await
            .get(token)
            .map(|username| Identity::new(username.clone()))
    }

    /// Revoke a login. Returns the identity that was logged out, if any.
    pub async fn revoke(&self, token: &str) -> Option<Identity> {
        self.active
            .write()
            .await
            .remove(token)
            .map(Identity::new)
    }
}
