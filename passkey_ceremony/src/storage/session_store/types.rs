use async_trait::async_trait;

use crate::storage::errors::StorageError;
use crate::storage::types::{CeremonySession, CorrelationKey};

/// Store for in-flight ceremony sessions.
///
/// Implementations must be linearizable per key. Sessions whose
/// `expires_at` has passed are reported as absent by every read, whether or
/// not they have been purged yet.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Stores `session` under `key`. Returns true when a live session was
    /// replaced.
    async fn put(&self, key: CorrelationKey, session: CeremonySession)
    -> Result<bool, StorageError>;

    async fn get(&self, key: &CorrelationKey) -> Result<Option<CeremonySession>, StorageError>;

    /// Atomically removes and returns the session. Of two concurrent takes of
    /// the same key at most one observes `Some`.
    async fn take(&self, key: &CorrelationKey) -> Result<Option<CeremonySession>, StorageError>;

    /// Removes the session if present.
    async fn delete(&self, key: &CorrelationKey) -> Result<(), StorageError>;

    /// Drops every expired session and returns how many were dropped.
    async fn purge_expired(&self) -> Result<usize, StorageError>;

    /// Number of stored sessions, expired-but-unpurged ones included.
    async fn len(&self) -> Result<usize, StorageError>;

    async fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len().await? == 0)
    }
}
