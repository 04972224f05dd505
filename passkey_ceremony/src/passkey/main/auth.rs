use ring::digest;

use crate::config::{CeremonyConfig, UserVerification};
use crate::passkey::errors::PasskeyError;
use crate::utils::base64url_decode;

use super::types::{
    AuthenticationOptions, AuthenticatorData, AuthenticatorResponse, CredentialDescriptor,
    PUBLIC_KEY_TYPE, ParsedClientData,
};
use super::utils::Es256PublicKey;

pub(crate) fn create_authentication_options(
    config: &CeremonyConfig,
    challenge: String,
    allow_credentials: &[String],
) -> AuthenticationOptions {
    let options = AuthenticationOptions {
        challenge,
        timeout: config.timeout.as_millis() as u64,
        rp_id: config.rp_id.clone(),
        allow_credentials: allow_credentials
            .iter()
            .map(|id| CredentialDescriptor::public_key(id))
            .collect(),
        user_verification: config.user_verification,
    };

    tracing::debug!("Auth options: {:?}", options);

    options
}

/// Verifies an assertion against the stored credential key.
///
/// The caller has already matched the client data challenge to a live
/// session. The counter is returned inside the parsed authenticator data and
/// checked by the caller once the signature is known to be genuine.
pub(crate) fn verify_assertion(
    config: &CeremonyConfig,
    auth_response: &AuthenticatorResponse,
    client_data: &ParsedClientData,
    stored_public_key: &str,
    user_handle: &str,
    user_verification: UserVerification,
) -> Result<AuthenticatorData, PasskeyError> {
    if auth_response.type_ != PUBLIC_KEY_TYPE {
        return Err(PasskeyError::Format(format!(
            "Invalid credential type: {}",
            auth_response.type_
        )));
    }
    if auth_response.id != auth_response.raw_id {
        return Err(PasskeyError::Format("id and rawId differ".to_string()));
    }

    // type(="webauthn.get") and origin
    client_data.verify("webauthn.get", &config.origin)?;

    tracing::debug!(
        "Parsing authenticator data: {}",
        &auth_response.response.authenticator_data
    );

    let auth_data = AuthenticatorData::from_base64(&auth_response.response.authenticator_data)?;

    tracing::debug!("Parsed authenticator data: {:?}", auth_data);

    // rpIdHash and flags
    auth_data.verify(&config.rp_id, user_verification)?;

    if auth_data.attested_credential.is_some() {
        return Err(PasskeyError::AuthenticatorData(
            "Unexpected attested credential data in assertion".to_string(),
        ));
    }

    verify_user_handle(auth_response, user_handle)?;
    verify_signature(auth_response, client_data, &auth_data, stored_public_key)?;

    Ok(auth_data)
}

/// A user handle, when the authenticator returns one, must be the handle of
/// the user the ceremony was started for.
fn verify_user_handle(
    auth_response: &AuthenticatorResponse,
    user_handle: &str,
) -> Result<(), PasskeyError> {
    match auth_response.response.user_handle.as_deref() {
        Some(handle) if handle != user_handle => {
            tracing::error!("User handle mismatch: {} != {}", handle, user_handle);
            Err(PasskeyError::Verification("User handle mismatch".into()))
        }
        Some(_) => {
            tracing::debug!("User handle verified successfully");
            Ok(())
        }
        None => {
            tracing::debug!("No user handle provided");
            Ok(())
        }
    }
}

fn verify_signature(
    auth_response: &AuthenticatorResponse,
    client_data: &ParsedClientData,
    auth_data: &AuthenticatorData,
    stored_public_key: &str,
) -> Result<(), PasskeyError> {
    let cose_key = base64url_decode(stored_public_key)
        .map_err(|e| PasskeyError::Format(format!("Invalid public key: {e}")))?;
    let public_key = Es256PublicKey::from_cose_bytes(&cose_key)?;

    let signature = base64url_decode(&auth_response.response.signature)
        .map_err(|e| PasskeyError::Format(format!("Invalid signature: {e}")))?;

    tracing::debug!("Decoded signature length: {}", signature.len());

    let client_data_hash = digest::digest(&digest::SHA256, &client_data.raw_data);
    let mut signed_data = Vec::with_capacity(auth_data.raw_data.len() + 32);
    signed_data.extend_from_slice(&auth_data.raw_data);
    signed_data.extend_from_slice(client_data_hash.as_ref());

    public_key.verify(&signed_data, &signature).inspect_err(|e| {
        tracing::error!("Signature verification failed: {}", e);
    })
}

/// Sign counter rule: the reported counter must advance, except when both
/// sides report 0 (authenticator without a counter).
pub(crate) fn counter_advances(stored: u32, received: u32) -> bool {
    (stored == 0 && received == 0) || received > stored
}
