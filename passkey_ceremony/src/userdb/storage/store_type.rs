use async_trait::async_trait;

use crate::storage::StorageError;
use crate::userdb::types::{RegisteredCredential, User};

/// Credential store: users keyed by name, each with its passkeys.
///
/// Every operation is atomic per user. Credential IDs are unique across the
/// whole store.
///
/// The coordinator never removes users. `delete_user` and `credential_owner`
/// are administrative operations for the hosting application (account
/// removal, support lookups) and are not called during a ceremony.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn get_user(&self, name: &str) -> Result<Option<User>, StorageError>;

    /// Inserts or replaces the user (last writer wins).
    async fn put_user(&self, user: User) -> Result<(), StorageError>;

    /// Removes the user and its credentials, releasing their credential IDs
    /// for registration by anyone. Missing users are not an error.
    async fn delete_user(&self, name: &str) -> Result<(), StorageError>;

    /// Inserts `user` unless a user with the same name exists. Returns the
    /// stored user and whether it was created by this call.
    async fn create_user_if_absent(&self, user: User) -> Result<(User, bool), StorageError>;

    /// Appends a credential to the user and returns the new credential count.
    ///
    /// Fails with [`StorageError::NotFound`] when the user does not exist and
    /// with [`StorageError::Conflict`] when any user already owns the ID.
    async fn add_credential(
        &self,
        name: &str,
        credential: RegisteredCredential,
    ) -> Result<usize, StorageError>;

    /// Sets the credential's sign count to `new` if it currently equals
    /// `expected`, refreshing `last_used_at`. Returns false when the stored
    /// count had moved.
    async fn compare_and_swap_sign_count(
        &self,
        name: &str,
        credential_id: &str,
        expected: u32,
        new: u32,
    ) -> Result<bool, StorageError>;

    /// Name of the user owning `credential_id`, if any.
    async fn credential_owner(&self, credential_id: &str) -> Result<Option<String>, StorageError>;
}
