//! passkey_ceremony - WebAuthn relying-party ceremony coordination
//!
//! This crate runs the server side of passkey registration and
//! authentication: it issues challenges, binds them to short-lived ceremony
//! sessions, verifies attestation and assertion payloads, and keeps the
//! credential store consistent (unique credential IDs, monotonic sign
//! counters, exactly-once consumption of every challenge).

mod config;
mod coordination;
mod passkey;
mod storage;
mod userdb;
mod utils;

pub use config::{AttestationPreference, CeremonyConfig, RegistrationPolicy, UserVerification};

pub use coordination::{
    AuthenticationOutcome, CoordinationError, Coordinator, RegistrationOutcome,
    RegistrationRequestOptions, spawn_session_reaper,
};

pub use passkey::{
    AuthenticationOptions, AuthenticatorAssertionResponse, AuthenticatorAttestationResponse,
    AuthenticatorResponse, AuthenticatorSelection, CredentialDescriptor, PasskeyError,
    PubKeyCredParam, PublicKeyCredentialUserEntity, RegisterCredential, RegistrationOptions,
    RelyingParty,
};

pub use storage::{
    CeremonyKind, CeremonySession, CorrelationKey, InMemorySessionStore, SessionStore,
    StorageError,
};

pub use userdb::{InMemoryUserStore, RegisteredCredential, User, UserStore};

pub use utils::{UtilError, gen_random_string};
