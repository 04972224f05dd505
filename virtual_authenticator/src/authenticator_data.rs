use ciborium::value::Value;
use ring::digest;

use crate::errors::AuthenticatorError;

pub(crate) mod flags {
    pub(crate) const USER_PRESENT: u8 = 0x01;
    pub(crate) const USER_VERIFIED: u8 = 0x04;
    pub(crate) const BACKUP_ELIGIBLE: u8 = 0x08;
    pub(crate) const BACKUP_STATE: u8 = 0x10;
    pub(crate) const ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
}

pub(crate) fn rp_id_hash(rp_id: &str) -> [u8; 32] {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(digest::digest(&digest::SHA256, rp_id.as_bytes()).as_ref());
    hash
}

/// Attested credential data carried by a registration.
pub(crate) struct AttestedCredential<'a> {
    pub(crate) aaguid: [u8; 16],
    pub(crate) credential_id: &'a [u8],
    pub(crate) public_key_x: [u8; 32],
    pub(crate) public_key_y: [u8; 32],
}

/// Builds authenticator data. The AT flag is set whenever `attested` is
/// present.
pub(crate) fn build_auth_data(
    rp_id: &str,
    mut flag_bits: u8,
    sign_count: u32,
    attested: Option<&AttestedCredential<'_>>,
) -> Result<Vec<u8>, AuthenticatorError> {
    if attested.is_some() {
        flag_bits |= flags::ATTESTED_CREDENTIAL_DATA;
    }

    let mut data = Vec::with_capacity(37);
    data.extend_from_slice(&rp_id_hash(rp_id));
    data.push(flag_bits);
    data.extend_from_slice(&sign_count.to_be_bytes());

    if let Some(cred) = attested {
        let cred_id_len = u16::try_from(cred.credential_id.len()).map_err(|_| {
            AuthenticatorError::Encoding("Credential ID too long".to_string())
        })?;
        data.extend_from_slice(&cred.aaguid);
        data.extend_from_slice(&cred_id_len.to_be_bytes());
        data.extend_from_slice(cred.credential_id);
        data.extend_from_slice(&encode_cose_key(&cred.public_key_x, &cred.public_key_y)?);
    }

    Ok(data)
}

/// P-256 public key as a COSE_Key map (kty=2, alg=-7, crv=1, x, y).
pub(crate) fn encode_cose_key(x: &[u8; 32], y: &[u8; 32]) -> Result<Vec<u8>, AuthenticatorError> {
    let map = Value::Map(vec![
        (Value::Integer(1i64.into()), Value::Integer(2i64.into())),
        (Value::Integer(3i64.into()), Value::Integer((-7i64).into())),
        (Value::Integer((-1i64).into()), Value::Integer(1i64.into())),
        (Value::Integer((-2i64).into()), Value::Bytes(x.to_vec())),
        (Value::Integer((-3i64).into()), Value::Bytes(y.to_vec())),
    ]);
    to_cbor(&map)
}

pub(crate) fn to_cbor(value: &Value) -> Result<Vec<u8>, AuthenticatorError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| AuthenticatorError::Encoding(format!("CBOR encoding failed: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_auth_data_layout() {
        let data = build_auth_data("localhost", flags::USER_PRESENT, 7, None).unwrap();

        assert_eq!(data.len(), 37);
        assert_eq!(&data[..32], &rp_id_hash("localhost"));
        assert_eq!(data[32], flags::USER_PRESENT);
        assert_eq!(&data[33..37], &[0, 0, 0, 7]);
    }

    #[test]
    fn test_registration_auth_data_layout() {
        let cred = AttestedCredential {
            aaguid: [0xAB; 16],
            credential_id: &[1, 2, 3],
            public_key_x: [0x11; 32],
            public_key_y: [0x22; 32],
        };
        let data = build_auth_data("localhost", flags::USER_PRESENT, 0, Some(&cred)).unwrap();

        assert_eq!(data[32], flags::USER_PRESENT | flags::ATTESTED_CREDENTIAL_DATA);
        assert_eq!(&data[37..53], &[0xAB; 16]);
        assert_eq!(&data[53..55], &[0, 3]);
        assert_eq!(&data[55..58], &[1, 2, 3]);

        let cose: Value = ciborium::from_reader(&data[58..]).unwrap();
        let Value::Map(entries) = cose else {
            panic!("COSE key is not a map");
        };
        assert_eq!(entries.len(), 5);
        assert!(entries.contains(&(
            Value::Integer((-2i64).into()),
            Value::Bytes(vec![0x11; 32])
        )));
    }
}
