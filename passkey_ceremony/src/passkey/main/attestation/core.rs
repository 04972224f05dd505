use ring::digest;
use uuid::Uuid;

use crate::passkey::errors::PasskeyError;

use super::super::types::AttestationObject;
use super::super::utils::Es256PublicKey;
use super::none::verify_none_attestation;
use super::packed::verify_packed_attestation;

/// Verifies the attestation statement of `attestation` for the credential
/// key it introduces.
pub(crate) fn verify_attestation(
    attestation: &AttestationObject,
    credential_key: &Es256PublicKey,
    client_data: &[u8],
) -> Result<(), PasskeyError> {
    let client_data_hash = digest::digest(&digest::SHA256, client_data);

    match attestation.fmt.as_str() {
        "none" => {
            tracing::debug!("Using 'none' attestation format");
            verify_none_attestation(&attestation.att_stmt)
        }
        "packed" => {
            tracing::debug!("Using 'packed' attestation format");
            verify_packed_attestation(
                &attestation.auth_data,
                client_data_hash.as_ref(),
                &attestation.att_stmt,
                credential_key,
            )
            .map_err(|e| {
                PasskeyError::Verification(format!("Attestation verification failed: {e}"))
            })
        }
        other => Err(PasskeyError::Format(format!(
            "Unsupported attestation format: {other}"
        ))),
    }
}

pub(crate) fn extract_aaguid(aaguid: &[u8; 16]) -> String {
    Uuid::from_bytes(*aaguid).hyphenated().to_string()
}
