use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticatorError {
    /// Options JSON could not be parsed or does not fit this relying party
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Key generation, loading or signing failed
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}
