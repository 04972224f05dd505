use ciborium::value::Value as CborValue;
use ring::digest;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::config::UserVerification;
use crate::passkey::errors::PasskeyError;
use crate::utils::base64url_decode;

use super::utils::Es256PublicKey;

pub(crate) const PUBLIC_KEY_TYPE: &str = "public-key";

/// Options for initiating a WebAuthn registration request.
///
/// Serialized in the shape `navigator.credentials.create()` expects for its
/// `publicKey` member. Binary values are base64url strings without padding.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    pub challenge: String,
    pub rp: RelyingParty,
    pub user: PublicKeyCredentialUserEntity,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    /// Milliseconds.
    pub timeout: u64,
    pub exclude_credentials: Vec<CredentialDescriptor>,
    pub authenticator_selection: AuthenticatorSelection,
    pub attestation: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RelyingParty {
    pub id: String,
    pub name: String,
}

/// User entity exposed to the authenticator. `id` is the opaque user handle.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialUserEntity {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub type_: String,
    pub alg: i64,
}

/// Entry of `excludeCredentials` / `allowCredentials`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
}

impl CredentialDescriptor {
    pub(crate) fn public_key(id: &str) -> Self {
        Self {
            type_: PUBLIC_KEY_TYPE.to_string(),
            id: id.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    pub resident_key: String,
    pub require_resident_key: bool,
    pub user_verification: UserVerification,
}

/// Options for initiating a WebAuthn authentication request.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptions {
    pub challenge: String,
    /// Milliseconds.
    pub timeout: u64,
    pub rp_id: String,
    pub allow_credentials: Vec<CredentialDescriptor>,
    pub user_verification: UserVerification,
}

/// Credential returned by `navigator.credentials.create()`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCredential {
    pub id: String,
    #[serde(alias = "raw_id")]
    pub raw_id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub response: AuthenticatorAttestationResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAttestationResponse {
    #[serde(rename = "clientDataJSON", alias = "client_data_json")]
    pub client_data_json: String,
    #[serde(alias = "attestation_object")]
    pub attestation_object: String,
}

/// Credential returned by `navigator.credentials.get()`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorResponse {
    pub id: String,
    #[serde(alias = "raw_id")]
    pub raw_id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub response: AuthenticatorAssertionResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAssertionResponse {
    #[serde(rename = "clientDataJSON", alias = "client_data_json")]
    pub client_data_json: String,
    #[serde(alias = "authenticator_data")]
    pub authenticator_data: String,
    pub signature: String,
    #[serde(default, alias = "user_handle", skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}

#[derive(Debug)]
pub(crate) struct AttestationObject {
    pub(crate) fmt: String,
    pub(crate) auth_data: Vec<u8>,
    pub(crate) att_stmt: Vec<(CborValue, CborValue)>,
}

impl AttestationObject {
    pub(crate) fn from_base64(attestation_base64: &str) -> Result<Self, PasskeyError> {
        let attestation_bytes = base64url_decode(attestation_base64).map_err(|e| {
            PasskeyError::Format(format!("Failed to decode attestation object: {e}"))
        })?;

        let attestation_cbor: CborValue = ciborium::de::from_reader(&attestation_bytes[..])
            .map_err(|e| PasskeyError::Format(format!("Invalid CBOR data: {e}")))?;

        let CborValue::Map(map) = attestation_cbor else {
            return Err(PasskeyError::Format(
                "Invalid attestation format".to_string(),
            ));
        };

        let mut fmt = None;
        let mut auth_data = None;
        let mut att_stmt = None;

        for (key, value) in map {
            let CborValue::Text(k) = key else {
                continue;
            };
            match (k.as_str(), value) {
                ("fmt", CborValue::Text(f)) => fmt = Some(f),
                ("authData", CborValue::Bytes(d)) => auth_data = Some(d),
                ("attStmt", CborValue::Map(s)) => att_stmt = Some(s),
                _ => {}
            }
        }

        tracing::debug!(
            "Attestation format: {:?}, auth data length: {:?}",
            fmt,
            auth_data.as_ref().map(Vec::len)
        );

        match (fmt, auth_data, att_stmt) {
            (Some(fmt), Some(auth_data), Some(att_stmt)) => Ok(Self {
                fmt,
                auth_data,
                att_stmt,
            }),
            _ => Err(PasskeyError::Format(
                "Missing required attestation data".to_string(),
            )),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct WebAuthnClientData {
    #[serde(rename = "type")]
    type_: String,
    challenge: String,
    origin: String,
    #[serde(default)]
    cross_origin: Option<bool>,
}

/// Decoded `clientDataJSON` together with the raw bytes that get hashed into
/// the signed payload.
#[derive(Debug)]
pub(crate) struct ParsedClientData {
    pub(crate) challenge: String,
    pub(crate) origin: String,
    pub(crate) type_: String,
    pub(crate) cross_origin: bool,
    pub(crate) raw_data: Vec<u8>,
}

impl ParsedClientData {
    pub(crate) fn from_base64(client_data_json: &str) -> Result<Self, PasskeyError> {
        let raw_data = base64url_decode(client_data_json)
            .map_err(|e| PasskeyError::Format(format!("Failed to decode: {e}")))?;

        let data_str = std::str::from_utf8(&raw_data)
            .map_err(|e| PasskeyError::Format(format!("Invalid UTF-8: {e}")))?;

        let data: WebAuthnClientData = serde_json::from_str(data_str)
            .map_err(|e| PasskeyError::ClientData(format!("Invalid JSON: {e}")))?;

        if data.challenge.is_empty() {
            return Err(PasskeyError::ClientData("Missing challenge".into()));
        }

        Ok(Self {
            challenge: data.challenge,
            origin: data.origin,
            type_: data.type_,
            cross_origin: data.cross_origin.unwrap_or(false),
            raw_data,
        })
    }

    /// Constant-time comparison of the echoed challenge against the stored one.
    pub(crate) fn challenge_matches(&self, stored_challenge: &str) -> bool {
        self.challenge
            .as_bytes()
            .ct_eq(stored_challenge.as_bytes())
            .into()
    }

    /// Checks ceremony type and origin.
    pub(crate) fn verify(&self, expected_type: &str, origin: &str) -> Result<(), PasskeyError> {
        if self.type_ != expected_type {
            return Err(PasskeyError::ClientData(format!(
                "Invalid type. Expected '{expected_type}', Got: {}",
                self.type_
            )));
        }

        if self.origin != origin {
            return Err(PasskeyError::ClientData(format!(
                "Invalid origin. Expected: {origin}, Got: {}",
                self.origin
            )));
        }

        if self.cross_origin {
            return Err(PasskeyError::ClientData(
                "Cross-origin requests are not accepted".into(),
            ));
        }

        Ok(())
    }
}

/// Flags for AuthenticatorData as defined in WebAuthn spec Level 2
pub(crate) mod auth_data_flags {
    /// User Present (UP) - Bit 0
    pub(crate) const UP: u8 = 1 << 0;
    /// User Verified (UV) - Bit 2
    pub(crate) const UV: u8 = 1 << 2;
    /// Backup Eligibility (BE) - Bit 3
    pub(crate) const BE: u8 = 1 << 3;
    /// Backup State (BS) - Bit 4
    pub(crate) const BS: u8 = 1 << 4;
    /// Attested Credential Data Present - Bit 6
    pub(crate) const AT: u8 = 1 << 6;
    /// Extension Data Present - Bit 7
    pub(crate) const ED: u8 = 1 << 7;
}

const AUTH_DATA_MIN_LEN: usize = 37;
const MAX_CREDENTIAL_ID_LEN: usize = 1023;

/// Attested credential data carried by registration authenticator data.
#[derive(Debug)]
pub(crate) struct AttestedCredentialData {
    pub(crate) aaguid: [u8; 16],
    pub(crate) credential_id: Vec<u8>,
    pub(crate) public_key: Es256PublicKey,
}

/// AuthenticatorData structure as defined in WebAuthn spec Level 2
/// https://www.w3.org/TR/webauthn-2/#sctn-authenticator-data
#[derive(Debug)]
pub(crate) struct AuthenticatorData {
    /// SHA-256 hash of the RP ID (32 bytes)
    pub(crate) rp_id_hash: Vec<u8>,

    /// Flags (1 byte), see [`auth_data_flags`]
    pub(crate) flags: u8,

    /// Signature counter, 32-bit unsigned big-endian integer
    pub(crate) counter: u32,

    pub(crate) attested_credential: Option<AttestedCredentialData>,

    /// Raw authenticator data for signature verification
    pub(crate) raw_data: Vec<u8>,
}

impl AuthenticatorData {
    pub(crate) fn from_base64(auth_data: &str) -> Result<Self, PasskeyError> {
        let data = base64url_decode(auth_data)
            .map_err(|e| PasskeyError::Format(format!("Failed to decode: {e}")))?;
        Self::from_bytes(data)
    }

    /// Parse authenticator data
    /// Format (minimum 37 bytes):
    /// - RP ID Hash (32 bytes)
    /// - Flags (1 byte)
    /// - Counter (4 bytes)
    /// - Optional: Attested Credential Data (AAGUID, credential ID, COSE key)
    /// - Optional: Extensions
    pub(crate) fn from_bytes(data: Vec<u8>) -> Result<Self, PasskeyError> {
        if data.len() < AUTH_DATA_MIN_LEN {
            return Err(PasskeyError::AuthenticatorData(format!(
                "Authenticator data too short: {} bytes",
                data.len()
            )));
        }

        let flags = data[32];
        let counter = u32::from_be_bytes([data[33], data[34], data[35], data[36]]);

        let mut rest = &data[AUTH_DATA_MIN_LEN..];
        let attested_credential = if flags & auth_data_flags::AT != 0 {
            Some(parse_attested_credential(&mut rest)?)
        } else {
            None
        };

        if flags & auth_data_flags::ED != 0 {
            let _: CborValue = ciborium::de::from_reader(&mut rest).map_err(|e| {
                PasskeyError::AuthenticatorData(format!("Invalid extension data: {e}"))
            })?;
        }

        if !rest.is_empty() {
            return Err(PasskeyError::AuthenticatorData(format!(
                "{} trailing bytes after authenticator data",
                rest.len()
            )));
        }

        Ok(Self {
            rp_id_hash: data[..32].to_vec(),
            flags,
            counter,
            attested_credential,
            raw_data: data,
        })
    }

    pub(crate) fn is_user_present(&self) -> bool {
        (self.flags & auth_data_flags::UP) != 0
    }

    pub(crate) fn is_user_verified(&self) -> bool {
        (self.flags & auth_data_flags::UV) != 0
    }

    pub(crate) fn is_backup_eligible(&self) -> bool {
        (self.flags & auth_data_flags::BE) != 0
    }

    pub(crate) fn is_backed_up(&self) -> bool {
        (self.flags & auth_data_flags::BS) != 0
    }

    /// Checks rpIdHash, UP, UV (when required) and BE/BS consistency.
    pub(crate) fn verify(
        &self,
        rp_id: &str,
        user_verification: UserVerification,
    ) -> Result<(), PasskeyError> {
        let expected_hash = digest::digest(&digest::SHA256, rp_id.as_bytes());
        if self.rp_id_hash != expected_hash.as_ref() {
            return Err(PasskeyError::AuthenticatorData(
                "Invalid RP ID hash".to_string(),
            ));
        }

        if !self.is_user_present() {
            return Err(PasskeyError::AuthenticatorData(
                "User Present flag not set".to_string(),
            ));
        }

        if user_verification == UserVerification::Required && !self.is_user_verified() {
            return Err(PasskeyError::AuthenticatorData(
                "User Verification required but flag not set".to_string(),
            ));
        }

        if self.is_backed_up() && !self.is_backup_eligible() {
            return Err(PasskeyError::AuthenticatorData(
                "Backup State set without Backup Eligibility".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_attested_credential(rest: &mut &[u8]) -> Result<AttestedCredentialData, PasskeyError> {
    if rest.len() < 18 {
        return Err(PasskeyError::AuthenticatorData(
            "Attested credential data too short".to_string(),
        ));
    }

    let mut aaguid = [0u8; 16];
    aaguid.copy_from_slice(&rest[..16]);
    let cred_id_len = u16::from_be_bytes([rest[16], rest[17]]) as usize;
    *rest = &rest[18..];

    if cred_id_len == 0 || cred_id_len > MAX_CREDENTIAL_ID_LEN {
        return Err(PasskeyError::AuthenticatorData(format!(
            "Invalid credential ID length: {cred_id_len}"
        )));
    }
    if rest.len() < cred_id_len {
        return Err(PasskeyError::AuthenticatorData(
            "Authenticator data too short for credential ID".to_string(),
        ));
    }

    let credential_id = rest[..cred_id_len].to_vec();
    *rest = &rest[cred_id_len..];

    let key_cbor: CborValue = ciborium::de::from_reader(&mut *rest)
        .map_err(|e| PasskeyError::Format(format!("Invalid public key CBOR: {e}")))?;
    let public_key = Es256PublicKey::from_cose(&key_cbor)?;

    Ok(AttestedCredentialData {
        aaguid,
        credential_id,
        public_key,
    })
}
