use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::storage::errors::StorageError;
use crate::storage::types::{CeremonySession, CorrelationKey};

use super::types::SessionStore;

/// Sharded in-memory session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<CorrelationKey, CeremonySession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory ceremony session store");
        Self::default()
    }
}

impl std::fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(
        &self,
        key: CorrelationKey,
        session: CeremonySession,
    ) -> Result<bool, StorageError> {
        let replaced = self
            .sessions
            .insert(key, session)
            .is_some_and(|previous| !previous.is_expired());
        Ok(replaced)
    }

    async fn get(&self, key: &CorrelationKey) -> Result<Option<CeremonySession>, StorageError> {
        Ok(self
            .sessions
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value().clone()))
    }

    async fn take(&self, key: &CorrelationKey) -> Result<Option<CeremonySession>, StorageError> {
        let Some((_, session)) = self.sessions.remove(key) else {
            return Ok(None);
        };
        if session.is_expired() {
            tracing::debug!("Session {} expired at {}", key, session.expires_at);
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn delete(&self, key: &CorrelationKey) -> Result<(), StorageError> {
        self.sessions.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, StorageError> {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_expired_at(now));
        Ok(before.saturating_sub(self.sessions.len()))
    }

    async fn len(&self) -> Result<usize, StorageError> {
        Ok(self.sessions.len())
    }
}
