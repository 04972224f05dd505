use thiserror::Error;

use crate::storage::StorageError;
use crate::utils::UtilError;

/// Errors returned by the ceremony coordinator.
///
/// Every variant is final: nothing is retried, and a finish call that got as
/// far as locating its session has consumed it.
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// Malformed or missing input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Registration refused because the user exists
    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    /// No live session for the echoed challenge. Missing, expired, already
    /// consumed and issued-for-someone-else all look the same.
    #[error("Session not found")]
    SessionNotFound,

    #[error("Challenge mismatch")]
    ChallengeMismatch,

    #[error("Attestation invalid: {0}")]
    AttestationInvalid(String),

    #[error("Assertion invalid: {0}")]
    AssertionInvalid(String),

    /// Possible cloned authenticator
    #[error("Sign counter regression: stored {stored}, received {received}")]
    CounterRegression { stored: u32, received: u32 },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoordinationError {
    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::BadRequest(msg) => tracing::error!("Bad request: {}", msg),
            Self::AlreadyExists(name) => tracing::error!("User already exists: {}", name),
            Self::UserNotFound(name) => tracing::error!("User not found: {}", name),
            Self::SessionNotFound => tracing::error!("Session not found"),
            Self::ChallengeMismatch => tracing::error!("Challenge mismatch"),
            Self::AttestationInvalid(msg) => tracing::error!("Attestation invalid: {}", msg),
            Self::AssertionInvalid(msg) => tracing::error!("Assertion invalid: {}", msg),
            Self::CounterRegression { stored, received } => tracing::warn!(
                "Sign counter regression: stored {}, received {}",
                stored,
                received
            ),
            Self::Storage(msg) => tracing::error!("Storage error: {}", msg),
        }
        self
    }

    /// Ceremony failures are never worth retrying with the same payload.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<StorageError> for CoordinationError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<UtilError> for CoordinationError {
    fn from(err: UtilError) -> Self {
        Self::Storage(err.to_string())
    }
}
