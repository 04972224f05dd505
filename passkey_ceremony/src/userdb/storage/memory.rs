use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::storage::StorageError;
use crate::userdb::types::{RegisteredCredential, User};

use super::store_type::UserStore;

/// Sharded in-memory credential store.
///
/// `credential_index` maps every credential ID to the owning user's name and
/// enforces global uniqueness. Code paths that hold locks in both maps take
/// the index first.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, User>,
    credential_index: DashMap<String, String>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory user store");
        Self::default()
    }

    fn index_credentials(&self, user: &User) {
        for credential in &user.credentials {
            self.credential_index
                .insert(credential.credential_id.clone(), user.name.clone());
        }
    }

    fn unindex_credentials(&self, user: &User) {
        for credential in &user.credentials {
            self.credential_index
                .remove_if(&credential.credential_id, |_, owner| *owner == user.name);
        }
    }
}

impl std::fmt::Debug for InMemoryUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUserStore")
            .field("users", &self.users.len())
            .field("credentials", &self.credential_index.len())
            .finish()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, name: &str) -> Result<Option<User>, StorageError> {
        Ok(self.users.get(name).map(|user| user.value().clone()))
    }

    #[tracing::instrument(skip(self, user), fields(user_name = %user.name))]
    async fn put_user(&self, user: User) -> Result<(), StorageError> {
        if let Some(previous) = self.users.insert(user.name.clone(), user.clone()) {
            self.unindex_credentials(&previous);
        }
        self.index_credentials(&user);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_user(&self, name: &str) -> Result<(), StorageError> {
        if let Some((_, user)) = self.users.remove(name) {
            self.unindex_credentials(&user);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, user), fields(user_name = %user.name))]
    async fn create_user_if_absent(&self, user: User) -> Result<(User, bool), StorageError> {
        let (stored, created) = match self.users.entry(user.name.clone()) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                (user, true)
            }
        };

        if created {
            self.index_credentials(&stored);
            tracing::debug!("Created user {}", stored.name);
        }

        Ok((stored, created))
    }

    #[tracing::instrument(skip(self, credential), fields(credential_id = %credential.credential_id))]
    async fn add_credential(
        &self,
        name: &str,
        credential: RegisteredCredential,
    ) -> Result<usize, StorageError> {
        match self.credential_index.entry(credential.credential_id.clone()) {
            Entry::Occupied(owner) => Err(StorageError::Conflict(format!(
                "credential {} already registered to {}",
                credential.credential_id,
                owner.get()
            ))),
            Entry::Vacant(slot) => {
                let mut user = self
                    .users
                    .get_mut(name)
                    .ok_or_else(|| StorageError::NotFound(format!("user {name}")))?;
                user.credentials.push(credential);
                user.updated_at = Utc::now();
                let count = user.credentials.len();
                drop(user);
                slot.insert(name.to_string());
                Ok(count)
            }
        }
    }

    async fn compare_and_swap_sign_count(
        &self,
        name: &str,
        credential_id: &str,
        expected: u32,
        new: u32,
    ) -> Result<bool, StorageError> {
        let mut user = self
            .users
            .get_mut(name)
            .ok_or_else(|| StorageError::NotFound(format!("user {name}")))?;

        let now = Utc::now();
        let credential = user
            .credentials
            .iter_mut()
            .find(|c| c.credential_id == credential_id)
            .ok_or_else(|| StorageError::NotFound(format!("credential {credential_id}")))?;

        if credential.sign_count != expected {
            return Ok(false);
        }
        credential.sign_count = new;
        credential.last_used_at = now;
        user.updated_at = now;
        Ok(true)
    }

    async fn credential_owner(&self, credential_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .credential_index
            .get(credential_id)
            .map(|owner| owner.value().clone()))
    }
}
