use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::UserVerification;

/// Which of the two ceremonies a session belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeremonyKind {
    Registration,
    Authentication,
}

impl CeremonyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Authentication => "authentication",
        }
    }
}

impl fmt::Display for CeremonyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key a ceremony session is stored under: the ceremony kind plus the
/// challenge issued for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    kind: CeremonyKind,
    challenge: String,
}

impl CorrelationKey {
    pub fn new(kind: CeremonyKind, challenge: impl Into<String>) -> Self {
        Self {
            kind,
            challenge: challenge.into(),
        }
    }

    pub fn registration(challenge: impl Into<String>) -> Self {
        Self::new(CeremonyKind::Registration, challenge)
    }

    pub fn authentication(challenge: impl Into<String>) -> Self {
        Self::new(CeremonyKind::Authentication, challenge)
    }

    pub fn kind(&self) -> CeremonyKind {
        self.kind
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.challenge)
    }
}

/// Server-side state of one in-flight ceremony.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CeremonySession {
    pub kind: CeremonyKind,
    pub challenge: String,
    pub username: String,
    pub user_handle: String,
    /// Credential IDs the user already had when registration began.
    #[serde(default)]
    pub exclude_credentials: Vec<String>,
    /// Credential IDs acceptable for this authentication.
    #[serde(default)]
    pub allow_credentials: Vec<String>,
    pub user_verification: UserVerification,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CeremonySession {
    pub fn key(&self) -> CorrelationKey {
        CorrelationKey::new(self.kind, self.challenge.clone())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
