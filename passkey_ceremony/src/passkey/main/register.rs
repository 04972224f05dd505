use crate::config::{CeremonyConfig, UserVerification};
use crate::passkey::errors::PasskeyError;
use crate::utils::{base64url_decode, base64url_encode};

use super::attestation::{extract_aaguid, verify_attestation};
use super::types::{
    AttestationObject, AuthenticatorData, AuthenticatorSelection, CredentialDescriptor,
    PUBLIC_KEY_TYPE, ParsedClientData, PubKeyCredParam, PublicKeyCredentialUserEntity,
    RegisterCredential, RegistrationOptions, RelyingParty,
};
use super::utils::ES256_ALG;

/// Credential data extracted from a successfully verified attestation.
#[derive(Debug, Clone)]
pub(crate) struct VerifiedCredential {
    /// base64url credential ID
    pub(crate) credential_id: String,
    /// base64url COSE_Key
    pub(crate) public_key: String,
    pub(crate) sign_count: u32,
    pub(crate) aaguid: String,
    pub(crate) backup_eligible: bool,
    pub(crate) backup_state: bool,
}

pub(crate) fn create_registration_options(
    config: &CeremonyConfig,
    challenge: String,
    user: PublicKeyCredentialUserEntity,
    exclude_credentials: &[String],
) -> RegistrationOptions {
    let options = RegistrationOptions {
        challenge,
        rp: RelyingParty {
            id: config.rp_id.clone(),
            name: config.rp_name.clone(),
        },
        user,
        pub_key_cred_params: vec![PubKeyCredParam {
            type_: PUBLIC_KEY_TYPE.to_string(),
            alg: ES256_ALG,
        }],
        timeout: config.timeout.as_millis() as u64,
        exclude_credentials: exclude_credentials
            .iter()
            .map(|id| CredentialDescriptor::public_key(id))
            .collect(),
        authenticator_selection: AuthenticatorSelection {
            resident_key: "preferred".to_string(),
            require_resident_key: false,
            user_verification: config.user_verification,
        },
        attestation: config.attestation.as_str().to_string(),
    };

    tracing::debug!("Registration options: {:?}", options);

    options
}

/// Verifies a registration response whose client data has already been
/// parsed and matched against a live session.
///
/// Checks, in order: credential type and ID binding, client data type and
/// origin, the attestation object, rpIdHash and flags, the credential public
/// key and finally the attestation statement.
pub(crate) fn verify_registration(
    config: &CeremonyConfig,
    reg_data: &RegisterCredential,
    client_data: &ParsedClientData,
    user_verification: UserVerification,
) -> Result<VerifiedCredential, PasskeyError> {
    if reg_data.type_ != PUBLIC_KEY_TYPE {
        return Err(PasskeyError::Format(format!(
            "Invalid credential type: {}",
            reg_data.type_
        )));
    }

    client_data.verify("webauthn.create", &config.origin)?;

    let attestation_obj = AttestationObject::from_base64(&reg_data.response.attestation_object)?;
    let auth_data = AuthenticatorData::from_bytes(attestation_obj.auth_data.clone())?;

    tracing::debug!(
        "Registration auth data flags: {:#04x}, counter: {}",
        auth_data.flags,
        auth_data.counter
    );

    auth_data.verify(&config.rp_id, user_verification)?;

    let attested = auth_data.attested_credential.as_ref().ok_or_else(|| {
        PasskeyError::AuthenticatorData("No attested credential data present".to_string())
    })?;

    let raw_id = base64url_decode(&reg_data.raw_id)
        .map_err(|e| PasskeyError::Format(format!("Invalid rawId: {e}")))?;
    if raw_id != attested.credential_id {
        return Err(PasskeyError::Verification(
            "Credential ID in authenticator data does not match rawId".to_string(),
        ));
    }
    if reg_data.id != reg_data.raw_id {
        return Err(PasskeyError::Format("id and rawId differ".to_string()));
    }

    verify_attestation(&attestation_obj, &attested.public_key, &client_data.raw_data)?;

    let credential = VerifiedCredential {
        credential_id: base64url_encode(&attested.credential_id),
        public_key: base64url_encode(&attested.public_key.to_cose_bytes()?),
        sign_count: auth_data.counter,
        aaguid: extract_aaguid(&attested.aaguid),
        backup_eligible: auth_data.is_backup_eligible(),
        backup_state: auth_data.is_backed_up(),
    };

    tracing::debug!(
        "Verified credential {} (aaguid {})",
        credential.credential_id,
        credential.aaguid
    );

    Ok(credential)
}
