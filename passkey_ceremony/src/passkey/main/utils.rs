use ciborium::value::Value as CborValue;
use ring::signature::{ECDSA_P256_SHA256_ASN1, UnparsedPublicKey};

use crate::passkey::errors::PasskeyError;

pub(crate) const ES256_ALG: i64 = -7;

const COSE_KEY_KTY: i64 = 1;
const COSE_KEY_ALG: i64 = 3;
const COSE_KEY_CRV: i64 = -1;
const COSE_KEY_X: i64 = -2;
const COSE_KEY_Y: i64 = -3;
const COSE_KTY_EC2: i64 = 2;
const COSE_CRV_P256: i64 = 1;
const P256_COORD_LEN: usize = 32;

pub(crate) fn cbor_to_i64(value: &CborValue) -> Option<i64> {
    match value {
        CborValue::Integer(i) => i64::try_from(*i).ok(),
        _ => None,
    }
}

/// ES256 credential public key (EC2, P-256) as carried in a COSE_Key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Es256PublicKey {
    pub(crate) x: Vec<u8>,
    pub(crate) y: Vec<u8>,
}

impl Es256PublicKey {
    pub(crate) fn from_cose(value: &CborValue) -> Result<Self, PasskeyError> {
        let CborValue::Map(map) = value else {
            return Err(PasskeyError::Format("Invalid public key format".to_string()));
        };

        let mut kty = None;
        let mut alg = None;
        let mut crv = None;
        let mut x = None;
        let mut y = None;

        for (key, value) in map {
            match cbor_to_i64(key) {
                Some(COSE_KEY_KTY) => kty = cbor_to_i64(value),
                Some(COSE_KEY_ALG) => alg = cbor_to_i64(value),
                Some(COSE_KEY_CRV) => crv = cbor_to_i64(value),
                Some(COSE_KEY_X) => x = value.as_bytes().cloned(),
                Some(COSE_KEY_Y) => y = value.as_bytes().cloned(),
                _ => {}
            }
        }

        if kty != Some(COSE_KTY_EC2) {
            return Err(PasskeyError::Verification(format!(
                "Unsupported key type: {kty:?}"
            )));
        }
        if alg != Some(ES256_ALG) {
            return Err(PasskeyError::Verification(format!(
                "Unsupported or unrecognized algorithm: {alg:?}"
            )));
        }
        if crv != Some(COSE_CRV_P256) {
            return Err(PasskeyError::Verification(format!(
                "Unsupported curve: {crv:?}"
            )));
        }

        match (x, y) {
            (Some(x), Some(y)) if x.len() == P256_COORD_LEN && y.len() == P256_COORD_LEN => {
                Ok(Self { x, y })
            }
            _ => Err(PasskeyError::Format(
                "Missing or invalid key coordinates".to_string(),
            )),
        }
    }

    pub(crate) fn from_cose_bytes(bytes: &[u8]) -> Result<Self, PasskeyError> {
        let value: CborValue = ciborium::de::from_reader(bytes)
            .map_err(|e| PasskeyError::Format(format!("Invalid public key CBOR: {e}")))?;
        Self::from_cose(&value)
    }

    pub(crate) fn to_cose_bytes(&self) -> Result<Vec<u8>, PasskeyError> {
        let value = CborValue::Map(vec![
            (
                CborValue::Integer(COSE_KEY_KTY.into()),
                CborValue::Integer(COSE_KTY_EC2.into()),
            ),
            (
                CborValue::Integer(COSE_KEY_ALG.into()),
                CborValue::Integer(ES256_ALG.into()),
            ),
            (
                CborValue::Integer(COSE_KEY_CRV.into()),
                CborValue::Integer(COSE_CRV_P256.into()),
            ),
            (
                CborValue::Integer(COSE_KEY_X.into()),
                CborValue::Bytes(self.x.clone()),
            ),
            (
                CborValue::Integer(COSE_KEY_Y.into()),
                CborValue::Bytes(self.y.clone()),
            ),
        ]);
        let mut out = Vec::new();
        ciborium::ser::into_writer(&value, &mut out)
            .map_err(|e| PasskeyError::Format(format!("Failed to encode public key: {e}")))?;
        Ok(out)
    }

    /// SEC1 uncompressed point, `0x04 || x || y`.
    pub(crate) fn uncompressed_point(&self) -> Vec<u8> {
        let mut point = Vec::with_capacity(1 + 2 * P256_COORD_LEN);
        point.push(0x04);
        point.extend_from_slice(&self.x);
        point.extend_from_slice(&self.y);
        point
    }

    /// Verifies an ASN.1 DER ECDSA P-256/SHA-256 signature over `message`.
    pub(crate) fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), PasskeyError> {
        let point = self.uncompressed_point();
        UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, &point)
            .verify(message, signature)
            .map_err(|_| PasskeyError::Verification("Signature verification failed".into()))
    }
}
