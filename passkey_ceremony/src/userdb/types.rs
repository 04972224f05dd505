use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account and the passkeys bound to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Account name, unique per store
    pub name: String,
    /// Display name shown by authenticators
    pub display_name: String,
    /// Opaque WebAuthn user handle (base64url, 32 random bytes)
    pub handle: String,
    pub credentials: Vec<RegisteredCredential>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user without credentials. The display name defaults to
    /// the account name.
    pub fn new(name: impl Into<String>, handle: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            display_name: name.clone(),
            name,
            handle: handle.into(),
            credentials: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn credential_ids(&self) -> Vec<String> {
        self.credentials
            .iter()
            .map(|c| c.credential_id.clone())
            .collect()
    }

    pub fn find_credential(&self, credential_id: &str) -> Option<&RegisteredCredential> {
        self.credentials
            .iter()
            .find(|c| c.credential_id == credential_id)
    }
}

/// A passkey bound to a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisteredCredential {
    /// base64url credential ID, unique across all users
    pub credential_id: String,
    /// base64url COSE_Key (EC2 / ES256 / P-256)
    pub public_key: String,
    pub sign_count: u32,
    /// Authenticator model, hyphenated UUID
    pub aaguid: String,
    pub backup_eligible: bool,
    pub backup_state: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}
