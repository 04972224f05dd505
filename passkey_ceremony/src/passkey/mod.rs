mod errors;
mod main;

pub use errors::PasskeyError;
pub use main::{
    AuthenticationOptions, AuthenticatorAssertionResponse, AuthenticatorAttestationResponse,
    AuthenticatorResponse, AuthenticatorSelection, CredentialDescriptor, PubKeyCredParam,
    PublicKeyCredentialUserEntity, RegisterCredential, RegistrationOptions, RelyingParty,
};

pub(crate) use main::{
    ParsedClientData, VerifiedCredential, counter_advances, create_authentication_options,
    create_registration_options, verify_assertion, verify_registration,
};
