//! Gateway orchestration: translates an authenticated identity plus a
//! requested session name into a connection token, and validates
//! departure requests.

use crate::auth::Identity;
use crate::errors::AgError;
use crate::models::ReleaseOutcome;
use crate::repositories::UserDirectory;
use crate::services::session_registry::SessionRegistry;
use std::sync::Arc;
use tracing::info;

pub struct AccessGateway {
    directory: Arc<UserDirectory>,
    registry: Arc<SessionRegistry>,
}

impl AccessGateway {
    pub fn new(directory: Arc<UserDirectory>, registry: Arc<SessionRegistry>) -> Self {
        Self {
            directory,
            registry,
        }
    }

    /// Issue a connection token for `session_name` on behalf of the
    /// authenticated caller.
    ///
    /// The caller's role comes from the directory; the metadata passed
    /// through to the other participants carries the caller's username.
    pub async fn request_token(
        &self,
        identity: &Identity,
        session_name: &str,
    ) -> Result<String, AgError> {
        let user = self
            .directory
            .find(identity.username())
            .ok_or_else(|| AgError::UnknownUser(identity.username().to_string()))?;

        info!(
            target: "ag.gateway",
            user = identity.username(),
            session_name,
            "Token requested"
        );

        let metadata = serde_json::json!({ "serverData": identity.username() });
        self.registry
            .acquire_token(session_name, user.role, &metadata)
            .await
    }

    /// Release a previously issued token.
    ///
    /// Any authenticated caller holding the token string may release it;
    /// the gateway does not verify issuance.
    pub async fn release_token(
        &self,
        identity: &Identity,
        session_name: &str,
        token: &str,
    ) -> Result<ReleaseOutcome, AgError> {
        info!(
            target: "ag.gateway",
            user = identity.username(),
            session_name,
            "Token release requested"
        );

        self.registry.release_token(session_name, token).await
    }
}
