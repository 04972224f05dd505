use serde::{Deserialize, Serialize};
use std::{env, fmt, time::Duration};
use url::Url;

use crate::passkey::PasskeyError;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CHALLENGE_TIMEOUT_SECS: u64 = 60;

/// WebAuthn user verification requirement sent to the authenticator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserVerification {
    Required,
    #[default]
    Preferred,
    Discouraged,
}

impl UserVerification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Preferred => "preferred",
            Self::Discouraged => "discouraged",
        }
    }
}

impl fmt::Display for UserVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attestation conveyance preference sent with registration options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttestationPreference {
    None,
    #[default]
    Direct,
    Indirect,
    Enterprise,
}

impl AttestationPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Direct => "direct",
            Self::Indirect => "indirect",
            Self::Enterprise => "enterprise",
        }
    }
}

/// What `begin_registration` does when the username is already known.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// Create the user when absent, otherwise enroll an additional credential.
    #[default]
    AutoCreate,
    /// Only usernames that do not exist yet may start a registration.
    NewUsersOnly,
}

/// Relying party settings for the ceremony coordinator.
#[derive(Clone, Debug)]
pub struct CeremonyConfig {
    /// Expected `origin` in client data, e.g. `http://localhost:8080`.
    pub origin: String,
    /// RP ID; its SHA-256 must head every authenticator data blob.
    pub rp_id: String,
    pub rp_name: String,
    /// Client-side timeout advertised in options.
    pub timeout: Duration,
    /// Lifetime of a ceremony session on the server.
    pub challenge_timeout: Duration,
    pub user_verification: UserVerification,
    pub attestation: AttestationPreference,
    pub registration_policy: RegistrationPolicy,
}

impl CeremonyConfig {
    /// Builds a configuration for `origin`, deriving the RP ID from its host.
    pub fn new(origin: &str) -> Result<Self, PasskeyError> {
        let (origin, rp_id) = parse_origin(origin)?;
        Ok(Self {
            rp_name: origin.clone(),
            origin,
            rp_id,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            challenge_timeout: Duration::from_secs(DEFAULT_CHALLENGE_TIMEOUT_SECS),
            user_verification: UserVerification::default(),
            attestation: AttestationPreference::default(),
            registration_policy: RegistrationPolicy::default(),
        })
    }

    /// Reads the configuration from environment variables.
    ///
    /// `ORIGIN` is required. Everything else falls back to a default, with a
    /// warning when a value is present but not recognized.
    pub fn from_env() -> Result<Self, PasskeyError> {
        let origin = env::var("ORIGIN")
            .map_err(|_| PasskeyError::Config("ORIGIN must be set".to_string()))?;
        let mut config = Self::new(&origin)?;

        if let Ok(rp_id) = env::var("PASSKEY_RP_ID") {
            config.rp_id = rp_id;
        }
        if let Ok(rp_name) = env::var("PASSKEY_RP_NAME") {
            config.rp_name = rp_name;
        }

        config.timeout = Duration::from_secs(parse_secs("PASSKEY_TIMEOUT", DEFAULT_TIMEOUT_SECS));
        config.challenge_timeout = Duration::from_secs(parse_secs(
            "PASSKEY_CHALLENGE_TIMEOUT",
            DEFAULT_CHALLENGE_TIMEOUT_SECS,
        ));

        config.user_verification = match env::var("PASSKEY_USER_VERIFICATION").ok() {
            None => UserVerification::default(),
            Some(v) => match v.to_lowercase().as_str() {
                "required" => UserVerification::Required,
                "preferred" => UserVerification::Preferred,
                "discouraged" => UserVerification::Discouraged,
                invalid => {
                    tracing::warn!(
                        "Invalid user verification: {}. Using default 'preferred'",
                        invalid
                    );
                    UserVerification::default()
                }
            },
        };

        config.attestation = match env::var("PASSKEY_ATTESTATION").ok() {
            None => AttestationPreference::default(),
            Some(v) => match v.to_lowercase().as_str() {
                "none" => AttestationPreference::None,
                "direct" => AttestationPreference::Direct,
                "indirect" => AttestationPreference::Indirect,
                "enterprise" => AttestationPreference::Enterprise,
                invalid => {
                    tracing::warn!("Invalid attestation: {}. Using default 'direct'", invalid);
                    AttestationPreference::default()
                }
            },
        };

        config.registration_policy = match env::var("PASSKEY_REGISTRATION_POLICY").ok() {
            None => RegistrationPolicy::default(),
            Some(v) => match v.to_lowercase().as_str() {
                "auto_create" => RegistrationPolicy::AutoCreate,
                "new_users_only" => RegistrationPolicy::NewUsersOnly,
                invalid => {
                    tracing::warn!(
                        "Invalid registration policy: {}. Using default 'auto_create'",
                        invalid
                    );
                    RegistrationPolicy::default()
                }
            },
        };

        tracing::debug!("Ceremony config: {:?}", config);

        Ok(config)
    }

    pub fn with_rp_name(mut self, rp_name: impl Into<String>) -> Self {
        self.rp_name = rp_name.into();
        self
    }

    pub fn with_rp_id(mut self, rp_id: impl Into<String>) -> Self {
        self.rp_id = rp_id.into();
        self
    }

    pub fn with_challenge_timeout(mut self, challenge_timeout: Duration) -> Self {
        self.challenge_timeout = challenge_timeout;
        self
    }

    pub fn with_user_verification(mut self, user_verification: UserVerification) -> Self {
        self.user_verification = user_verification;
        self
    }

    pub fn with_registration_policy(mut self, registration_policy: RegistrationPolicy) -> Self {
        self.registration_policy = registration_policy;
        self
    }
}

fn parse_origin(origin: &str) -> Result<(String, String), PasskeyError> {
    let url = Url::parse(origin)
        .map_err(|e| PasskeyError::Config(format!("Invalid ORIGIN {origin}: {e}")))?;
    let rp_id = url
        .host_str()
        .map(|s| s.to_string())
        .ok_or_else(|| PasskeyError::Config(format!("Could not extract RP ID from {origin}")))?;
    Ok((url.origin().ascii_serialization(), rp_id))
}

/// A zero timeout would expire every challenge on creation, so it falls back
/// to the default like any other unparsable value.
fn parse_secs(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Err(_) => default,
        Ok(v) => v.parse::<u64>().ok().filter(|s| *s > 0).unwrap_or_else(|| {
            tracing::warn!("Invalid {}: {}. Using default {}", name, v, default);
            default
        }),
    }
}
