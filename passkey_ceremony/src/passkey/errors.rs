use thiserror::Error;

/// Errors that can occur while verifying WebAuthn/Passkey payloads.
///
/// These are produced by the protocol layer (client data, authenticator data,
/// attestation statements and assertion signatures). The ceremony coordinator
/// folds them into `AttestationInvalid` or `AssertionInvalid` depending on
/// which phase produced them.
#[derive(Debug, Error)]
pub enum PasskeyError {
    /// Error related to passkey configuration (e.g., invalid RP ID, origin, or settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error validating the client data JSON from the browser
    #[error("Invalid client data: {0}")]
    ClientData(String),

    /// Error parsing or validating the authenticator data structure
    #[error("Invalid authenticator data: {0}")]
    AuthenticatorData(String),

    /// Error during cryptographic verification of attestations or assertions
    #[error("Verification error: {0}")]
    Verification(String),

    /// Error with improperly formatted data
    #[error("Invalid format: {0}")]
    Format(String),
}
