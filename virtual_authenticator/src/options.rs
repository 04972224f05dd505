use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::AuthenticatorError;

/// The parts of `PublicKeyCredentialCreationOptions` the authenticator uses.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AttestationOptions {
    pub(crate) challenge: String,
    pub(crate) rp: RpEntity,
    pub(crate) user: UserEntity,
    #[serde(default)]
    pub(crate) pub_key_cred_params: Vec<PubKeyCredParam>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct RpEntity {
    #[serde(default)]
    pub(crate) id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct UserEntity {
    pub(crate) id: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct PubKeyCredParam {
    pub(crate) alg: i64,
}

/// The parts of `PublicKeyCredentialRequestOptions` the authenticator uses.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssertionOptions {
    pub(crate) challenge: String,
    #[serde(default)]
    pub(crate) rp_id: Option<String>,
}

/// Parses options JSON, accepting both the bare options object and the
/// `{"publicKey": {...}}` wrapper browsers receive.
pub(crate) fn parse_options<T: DeserializeOwned>(json: &str) -> Result<T, AuthenticatorError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| AuthenticatorError::InvalidOptions(format!("Invalid JSON: {e}")))?;

    let inner = match value {
        serde_json::Value::Object(mut map) if map.contains_key("publicKey") => map
            .remove("publicKey")
            .unwrap_or(serde_json::Value::Null),
        other => other,
    };

    serde_json::from_value(inner)
        .map_err(|e| AuthenticatorError::InvalidOptions(e.to_string()))
}

/// Rejects options issued for a different RP ID.
pub(crate) fn check_rp_id(options_rp_id: Option<&str>, rp_id: &str) -> Result<(), AuthenticatorError> {
    match options_rp_id {
        Some(id) if id != rp_id => Err(AuthenticatorError::InvalidOptions(format!(
            "RP ID mismatch: options for {id}, relying party is {rp_id}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_and_wrapped() {
        let bare = r#"{"challenge":"abc","rpId":"localhost","allowCredentials":[]}"#;
        let wrapped = r#"{"publicKey":{"challenge":"abc","rpId":"localhost"}}"#;

        let a: AssertionOptions = parse_options(bare).unwrap();
        let b: AssertionOptions = parse_options(wrapped).unwrap();

        assert_eq!(a.challenge, "abc");
        assert_eq!(b.rp_id.as_deref(), Some("localhost"));
    }

    #[test]
    fn test_parse_missing_challenge() {
        let result: Result<AssertionOptions, _> = parse_options(r#"{"rpId":"localhost"}"#);
        assert!(matches!(result, Err(AuthenticatorError::InvalidOptions(_))));
    }

    #[test]
    fn test_parse_not_json() {
        let result: Result<AttestationOptions, _> = parse_options("<html>");
        assert!(matches!(result, Err(AuthenticatorError::InvalidOptions(_))));
    }

    #[test]
    fn test_check_rp_id() {
        assert!(check_rp_id(None, "localhost").is_ok());
        assert!(check_rp_id(Some("localhost"), "localhost").is_ok());
        assert!(check_rp_id(Some("evil.example"), "localhost").is_err());
    }
}
