use thiserror::Error;
use virtual_authenticator::AuthenticatorError;

#[derive(Debug, Error)]
pub(crate) enum LoadError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered a ceremony step with a non-success status
    #[error("{step} returned {status}: {body}")]
    Status {
        step: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Authenticator error: {0}")]
    Authenticator(#[from] AuthenticatorError),

    #[error("Unexpected response: {0}")]
    Response(String),
}
