//! virtual_authenticator - a software WebAuthn authenticator
//!
//! Produces registration and authentication responses that a conformant
//! relying party accepts: ES256 keys, packed self-attestation, echoed
//! challenges and origins, and a per-credential sign counter that stays
//! monotonic when one credential is shared across workers.
//!
//! ```no_run
//! use virtual_authenticator::{RelyingParty, create_assertion_response, create_credential};
//!
//! let rp = RelyingParty::new("Demo", "localhost", "http://localhost:8080");
//! let credential = create_credential()?;
//! let options = r#"{"challenge":"abc","rpId":"localhost"}"#;
//! let response = create_assertion_response(&rp, &credential, "", options)?;
//! # Ok::<(), virtual_authenticator::AuthenticatorError>(())
//! ```

mod authenticator;
mod authenticator_data;
mod credential;
mod errors;
mod options;
mod utils;

pub use authenticator::{
    AttestationFormat, Authenticator, AuthenticatorOptions, ICLOUD_KEYCHAIN_AAGUID, RelyingParty,
    create_assertion_response, create_attestation_response,
};
pub use credential::{Credential, create_credential};
pub use errors::AuthenticatorError;
