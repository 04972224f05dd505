use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::config::CeremonyConfig;
use crate::storage::{
    CeremonyKind, CeremonySession, CorrelationKey, InMemorySessionStore, SessionStore,
};
use crate::userdb::{InMemoryUserStore, User, UserStore};

use super::errors::CoordinationError;

/// Result of a successful `finish_registration`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub credential_id: String,
    /// Number of credentials the user holds after this registration
    pub credential_count: usize,
}

/// Result of a successful `finish_login`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthenticationOutcome {
    pub credential_id: String,
    pub sign_count: u32,
}

/// Drives registration and authentication ceremonies against a credential
/// store and a session store.
///
/// Cheap to share behind an `Arc`; all mutable state lives in the stores.
pub struct Coordinator {
    config: CeremonyConfig,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
}

impl Coordinator {
    pub fn new(
        config: CeremonyConfig,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            users,
            sessions,
        }
    }

    /// Coordinator backed by the in-memory stores.
    pub fn in_memory(config: CeremonyConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemorySessionStore::new()),
        )
    }

    pub fn config(&self) -> &CeremonyConfig {
        &self.config
    }

    pub fn user_store(&self) -> Arc<dyn UserStore> {
        self.users.clone()
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        self.sessions.clone()
    }

    pub(super) fn new_session(
        &self,
        kind: CeremonyKind,
        challenge: &str,
        user: &User,
        exclude_credentials: Vec<String>,
        allow_credentials: Vec<String>,
    ) -> Result<CeremonySession, CoordinationError> {
        let ttl = chrono::Duration::from_std(self.config.challenge_timeout).map_err(|e| {
            CoordinationError::Storage(format!("Invalid challenge timeout: {e}")).log()
        })?;
        let now = Utc::now();
        Ok(CeremonySession {
            kind,
            challenge: challenge.to_string(),
            username: user.name.clone(),
            user_handle: user.handle.clone(),
            exclude_credentials,
            allow_credentials,
            user_verification: self.config.user_verification,
            created_at: now,
            expires_at: now + ttl,
        })
    }

    pub(super) async fn store_session(
        &self,
        session: CeremonySession,
    ) -> Result<(), CoordinationError> {
        let key = session.key();
        if self.sessions.put(key.clone(), session).await? {
            tracing::warn!("Replaced live ceremony session {}", key);
        }
        Ok(())
    }

    /// Removes and returns the live session for `key`, which must have been
    /// issued for `user`. The session is gone afterwards whatever the outcome.
    pub(super) async fn take_session(
        &self,
        key: CorrelationKey,
        user: &User,
    ) -> Result<CeremonySession, CoordinationError> {
        let session = self
            .sessions
            .take(&key)
            .await?
            .ok_or_else(|| CoordinationError::SessionNotFound.log())?;

        if session.username != user.name || session.user_handle != user.handle {
            tracing::warn!(
                "Session {} was issued for {}, not {}",
                key,
                session.username,
                user.name
            );
            return Err(CoordinationError::SessionNotFound.log());
        }

        Ok(session)
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

pub(super) fn validate_username(username: &str) -> Result<&str, CoordinationError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(CoordinationError::BadRequest("username is required".to_string()).log());
    }
    Ok(trimmed)
}
