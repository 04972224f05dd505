use ciborium::value::Value;
use ring::digest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authenticator_data::{AttestedCredential, build_auth_data, flags, to_cbor};
use crate::credential::Credential;
use crate::errors::AuthenticatorError;
use crate::options::{AssertionOptions, AttestationOptions, check_rp_id, parse_options};
use crate::utils::{base64url_decode, base64url_encode};

/// AAGUID reported by iCloud Keychain passkeys.
pub const ICLOUD_KEYCHAIN_AAGUID: Uuid = Uuid::from_u128(0xfbfc3007_154e_4ecc_8c0b_6e020557d7bd);

const ES256_ALG: i64 = -7;

/// The relying party the authenticator talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingParty {
    pub name: String,
    pub id: String,
    pub origin: String,
}

impl RelyingParty {
    pub fn new(name: impl Into<String>, id: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            origin: origin.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationFormat {
    #[default]
    Packed,
    None,
}

impl AttestationFormat {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Packed => "packed",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorOptions {
    pub aaguid: Uuid,
    /// Returned as `userHandle` in assertions (base64url, as sent in `user.id`)
    pub user_handle: Option<String>,
    pub user_present: bool,
    pub user_verified: bool,
    pub backup_eligible: bool,
    pub backup_state: bool,
    pub attestation_format: AttestationFormat,
    /// When false every response reports a sign counter of 0
    pub reports_counter: bool,
}

impl Default for AuthenticatorOptions {
    fn default() -> Self {
        Self {
            aaguid: ICLOUD_KEYCHAIN_AAGUID,
            user_handle: None,
            user_present: true,
            user_verified: true,
            backup_eligible: true,
            backup_state: true,
            attestation_format: AttestationFormat::Packed,
            reports_counter: true,
        }
    }
}

#[derive(Serialize)]
struct ClientData<'a> {
    #[serde(rename = "type")]
    type_: &'a str,
    challenge: &'a str,
    origin: &'a str,
    #[serde(rename = "crossOrigin")]
    cross_origin: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialResponse<R> {
    id: String,
    raw_id: String,
    #[serde(rename = "type")]
    type_: &'static str,
    response: R,
    authenticator_attachment: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttestationResponse {
    #[serde(rename = "clientDataJSON")]
    client_data_json: String,
    attestation_object: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssertionResponse {
    #[serde(rename = "clientDataJSON")]
    client_data_json: String,
    authenticator_data: String,
    signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_handle: Option<String>,
}

/// A software authenticator.
///
/// Responses are real: client data carries the echoed challenge and the
/// relying party origin, authenticator data carries the SHA-256 of the RP ID,
/// and every signature is an ES256 signature by the credential key.
/// Excluded or allowed credential lists are not enforced here so callers can
/// exercise server-side rejection.
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    options: AuthenticatorOptions,
}

impl Authenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AuthenticatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AuthenticatorOptions {
        &self.options
    }

    fn flags(&self) -> u8 {
        let mut bits = 0;
        if self.options.user_present {
            bits |= flags::USER_PRESENT;
        }
        if self.options.user_verified {
            bits |= flags::USER_VERIFIED;
        }
        if self.options.backup_eligible {
            bits |= flags::BACKUP_ELIGIBLE;
        }
        if self.options.backup_state {
            bits |= flags::BACKUP_STATE;
        }
        bits
    }

    /// Answers registration options JSON with a `RegisterCredential` JSON
    /// document.
    pub fn create_attestation_response(
        &self,
        rp: &RelyingParty,
        credential: &Credential,
        attestation_options: &str,
    ) -> Result<String, AuthenticatorError> {
        let options: AttestationOptions = parse_options(attestation_options)?;
        check_rp_id(options.rp.id.as_deref(), &rp.id)?;

        if !options.pub_key_cred_params.is_empty()
            && !options.pub_key_cred_params.iter().any(|p| p.alg == ES256_ALG)
        {
            return Err(AuthenticatorError::InvalidOptions(
                "ES256 is not an accepted algorithm".to_string(),
            ));
        }
        base64url_decode(&options.user.id).map_err(|e| {
            AuthenticatorError::InvalidOptions(format!("Invalid user id encoding: {e}"))
        })?;

        tracing::debug!("Creating attestation for challenge {}", options.challenge);

        let client_data_json = client_data("webauthn.create", &options.challenge, rp)?;

        let (x, y) = credential.public_key_coords()?;
        let attested = AttestedCredential {
            aaguid: *self.options.aaguid.as_bytes(),
            credential_id: credential.id(),
            public_key_x: x,
            public_key_y: y,
        };
        let sign_count = if self.options.reports_counter {
            credential.counter()
        } else {
            0
        };
        let auth_data = build_auth_data(&rp.id, self.flags(), sign_count, Some(&attested))?;

        let att_stmt = match self.options.attestation_format {
            AttestationFormat::Packed => {
                let signature = credential.sign(&signed_payload(&auth_data, &client_data_json))?;
                vec![
                    (Value::Text("alg".into()), Value::Integer(ES256_ALG.into())),
                    (Value::Text("sig".into()), Value::Bytes(signature)),
                ]
            }
            AttestationFormat::None => Vec::new(),
        };

        let attestation_object = to_cbor(&Value::Map(vec![
            (
                Value::Text("fmt".into()),
                Value::Text(self.options.attestation_format.as_str().into()),
            ),
            (Value::Text("attStmt".into()), Value::Map(att_stmt)),
            (Value::Text("authData".into()), Value::Bytes(auth_data)),
        ]))?;

        let response = CredentialResponse {
            id: credential.id_base64(),
            raw_id: credential.id_base64(),
            type_: "public-key",
            response: AttestationResponse {
                client_data_json: base64url_encode(&client_data_json),
                attestation_object: base64url_encode(&attestation_object),
            },
            authenticator_attachment: "platform",
        };

        to_json(&response)
    }

    /// Answers authentication options JSON with an `AuthenticatorResponse`
    /// JSON document. Each call advances the credential counter by one unless
    /// counters are disabled.
    pub fn create_assertion_response(
        &self,
        rp: &RelyingParty,
        credential: &Credential,
        assertion_options: &str,
    ) -> Result<String, AuthenticatorError> {
        let options: AssertionOptions = parse_options(assertion_options)?;
        check_rp_id(options.rp_id.as_deref(), &rp.id)?;

        tracing::debug!("Creating assertion for challenge {}", options.challenge);

        let client_data_json = client_data("webauthn.get", &options.challenge, rp)?;

        let sign_count = if self.options.reports_counter {
            credential.next_counter()
        } else {
            0
        };
        let auth_data = build_auth_data(&rp.id, self.flags(), sign_count, None)?;
        let signature = credential.sign(&signed_payload(&auth_data, &client_data_json))?;

        let response = CredentialResponse {
            id: credential.id_base64(),
            raw_id: credential.id_base64(),
            type_: "public-key",
            response: AssertionResponse {
                client_data_json: base64url_encode(&client_data_json),
                authenticator_data: base64url_encode(&auth_data),
                signature: base64url_encode(&signature),
                user_handle: self.options.user_handle.clone(),
            },
            authenticator_attachment: "platform",
        };

        to_json(&response)
    }
}

fn client_data(
    type_: &str,
    challenge: &str,
    rp: &RelyingParty,
) -> Result<Vec<u8>, AuthenticatorError> {
    serde_json::to_vec(&ClientData {
        type_,
        challenge,
        origin: &rp.origin,
        cross_origin: false,
    })
    .map_err(|e| AuthenticatorError::Encoding(e.to_string()))
}

/// authenticatorData || SHA-256(clientDataJSON)
fn signed_payload(auth_data: &[u8], client_data_json: &[u8]) -> Vec<u8> {
    let client_data_hash = digest::digest(&digest::SHA256, client_data_json);
    let mut payload = Vec::with_capacity(auth_data.len() + 32);
    payload.extend_from_slice(auth_data);
    payload.extend_from_slice(client_data_hash.as_ref());
    payload
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AuthenticatorError> {
    serde_json::to_string(value).map_err(|e| AuthenticatorError::Encoding(e.to_string()))
}

/// Registration response from a backup-eligible, backed-up authenticator
/// reporting the iCloud Keychain AAGUID.
pub fn create_attestation_response(
    rp: &RelyingParty,
    credential: &Credential,
    attestation_options: &str,
) -> Result<String, AuthenticatorError> {
    Authenticator::new().create_attestation_response(rp, credential, attestation_options)
}

/// Assertion response carrying `user_handle`. An empty handle is omitted
/// from the response.
pub fn create_assertion_response(
    rp: &RelyingParty,
    credential: &Credential,
    user_handle: &str,
    assertion_options: &str,
) -> Result<String, AuthenticatorError> {
    let authenticator = Authenticator::with_options(AuthenticatorOptions {
        user_handle: (!user_handle.is_empty()).then(|| user_handle.to_string()),
        ..AuthenticatorOptions::default()
    });
    authenticator.create_assertion_response(rp, credential, assertion_options)
}
