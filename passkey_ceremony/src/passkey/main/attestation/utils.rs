use ciborium::value::Value as CborValue;

use crate::passkey::errors::PasskeyError;
use crate::passkey::main::utils::cbor_to_i64;

pub(super) fn get_sig_from_stmt(
    att_stmt: &[(CborValue, CborValue)],
) -> Result<(i64, Vec<u8>), PasskeyError> {
    let mut alg: Option<i64> = None;
    let mut sig: Option<Vec<u8>> = None;

    for (key, value) in att_stmt {
        match key {
            CborValue::Text(k) if k == "alg" => alg = cbor_to_i64(value),
            CborValue::Text(k) if k == "sig" => sig = value.as_bytes().cloned(),
            _ => {}
        }
    }

    match (alg, sig) {
        (Some(a), Some(s)) => Ok((a, s)),
        _ => Err(PasskeyError::Verification(
            "Missing algorithm or signature in attestation statement".to_string(),
        )),
    }
}

pub(super) fn has_stmt_key(att_stmt: &[(CborValue, CborValue)], name: &str) -> bool {
    att_stmt
        .iter()
        .any(|(k, _)| matches!(k, CborValue::Text(k) if k == name))
}
