use std::time::Duration;

use passkey_ceremony::{
    AuthenticationOptions, AuthenticationOutcome, AuthenticatorResponse, CeremonyConfig,
    CoordinationError, Coordinator, RegisterCredential, RegistrationOptions, RegistrationOutcome,
    RegistrationPolicy,
};
use virtual_authenticator::{Authenticator, AuthenticatorOptions, Credential, RelyingParty};

pub const ORIGIN: &str = "http://localhost:8080";
pub const RP_ID: &str = "localhost";

pub fn config() -> CeremonyConfig {
    CeremonyConfig::new(ORIGIN)
        .expect("valid origin")
        .with_rp_name("Passkey Demo")
}

pub fn coordinator() -> Coordinator {
    Coordinator::in_memory(config())
}

pub fn coordinator_with_policy(policy: RegistrationPolicy) -> Coordinator {
    Coordinator::in_memory(config().with_registration_policy(policy))
}

pub fn coordinator_with_challenge_timeout(timeout: Duration) -> Coordinator {
    Coordinator::in_memory(config().with_challenge_timeout(timeout))
}

pub fn relying_party() -> RelyingParty {
    RelyingParty::new("Passkey Demo", RP_ID, ORIGIN)
}

/// The same relying party as seen from a phishing origin
pub fn phishing_party() -> RelyingParty {
    RelyingParty::new("Passkey Demo", RP_ID, "https://evil.example")
}

/// Authenticator answering assertions with `user_handle`. An empty handle
/// leaves `userHandle` out of the response.
pub fn authenticator_for(user_handle: &str) -> Authenticator {
    Authenticator::with_options(AuthenticatorOptions {
        user_handle: (!user_handle.is_empty()).then(|| user_handle.to_string()),
        ..AuthenticatorOptions::default()
    })
}

pub fn attest(
    authenticator: &Authenticator,
    rp: &RelyingParty,
    credential: &Credential,
    options: &RegistrationOptions,
) -> RegisterCredential {
    let options_json = serde_json::to_string(options).expect("options serialize");
    let response = authenticator
        .create_attestation_response(rp, credential, &options_json)
        .expect("attestation response");
    serde_json::from_str(&response).expect("attestation response parses")
}

pub fn assert_with(
    authenticator: &Authenticator,
    rp: &RelyingParty,
    credential: &Credential,
    options: &AuthenticationOptions,
) -> AuthenticatorResponse {
    let options_json = serde_json::to_string(options).expect("options serialize");
    let response = authenticator
        .create_assertion_response(rp, credential, &options_json)
        .expect("assertion response");
    serde_json::from_str(&response).expect("assertion response parses")
}

/// begin → attestation → finish with the default authenticator.
/// Returns the outcome and the user handle the server assigned.
pub async fn register(
    coordinator: &Coordinator,
    username: &str,
    credential: &Credential,
) -> Result<(RegistrationOutcome, String), CoordinationError> {
    register_with(coordinator, &Authenticator::new(), username, credential).await
}

pub async fn register_with(
    coordinator: &Coordinator,
    authenticator: &Authenticator,
    username: &str,
    credential: &Credential,
) -> Result<(RegistrationOutcome, String), CoordinationError> {
    let options = coordinator.begin_registration(username).await?;
    let user_handle = options.user.id.clone();
    let reg_data = attest(authenticator, &relying_party(), credential, &options);
    let outcome = coordinator.finish_registration(username, reg_data).await?;
    Ok((outcome, user_handle))
}

/// begin → assertion → finish with an authenticator returning `user_handle`.
pub async fn login(
    coordinator: &Coordinator,
    username: &str,
    user_handle: &str,
    credential: &Credential,
) -> Result<AuthenticationOutcome, CoordinationError> {
    let options = coordinator.begin_login(username).await?;
    let response = assert_with(
        &authenticator_for(user_handle),
        &relying_party(),
        credential,
        &options,
    );
    coordinator.finish_login(username, response).await
}
