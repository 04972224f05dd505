use ciborium::value::Value as CborValue;

use crate::passkey::errors::PasskeyError;

use super::super::utils::{ES256_ALG, Es256PublicKey};
use super::utils::{get_sig_from_stmt, has_stmt_key};

/// Verifies a packed attestation statement
///
/// Only self attestation is accepted: the statement is signed with the
/// credential private key itself. Certificate based (`x5c`) and ECDAA
/// statements are rejected.
///
/// # Errors
/// * `PasskeyError::Verification` - If the attestation is invalid
pub(super) fn verify_packed_attestation(
    auth_data: &[u8],
    client_data_hash: &[u8],
    att_stmt: &[(CborValue, CborValue)],
    credential_key: &Es256PublicKey,
) -> Result<(), PasskeyError> {
    let (alg, sig) = get_sig_from_stmt(att_stmt)?;

    if alg != ES256_ALG {
        return Err(PasskeyError::Verification(format!(
            "Unsupported or unrecognized algorithm: {alg}"
        )));
    }

    let mut signed_data = Vec::with_capacity(auth_data.len() + client_data_hash.len());
    signed_data.extend_from_slice(auth_data);
    signed_data.extend_from_slice(client_data_hash);

    match (
        has_stmt_key(att_stmt, "x5c"),
        has_stmt_key(att_stmt, "ecdaaKeyId"),
    ) {
        (false, false) => {
            tracing::debug!("Self attestation");
            credential_key.verify(&signed_data, &sig).map_err(|_| {
                PasskeyError::Verification("Self attestation signature invalid".to_string())
            })
        }
        (true, false) => Err(PasskeyError::Verification(
            "Certificate attestation (x5c) not supported".to_string(),
        )),
        (false, true) => Err(PasskeyError::Verification(
            "ECDAA attestation not supported".to_string(),
        )),
        (true, true) => Err(PasskeyError::Verification(
            "Invalid attestation: both x5c and ecdaaKeyId present".to_string(),
        )),
    }
}
