mod attestation;
mod auth;
mod register;
mod types;
mod utils;

pub(crate) use auth::{counter_advances, create_authentication_options, verify_assertion};
pub(crate) use register::{VerifiedCredential, create_registration_options, verify_registration};
pub(crate) use types::ParsedClientData;

pub use types::{
    AuthenticationOptions, AuthenticatorAssertionResponse, AuthenticatorAttestationResponse,
    AuthenticatorResponse, AuthenticatorSelection, CredentialDescriptor, PubKeyCredParam,
    PublicKeyCredentialUserEntity, RegisterCredential, RegistrationOptions, RelyingParty,
};
