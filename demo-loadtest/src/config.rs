use std::str::FromStr;
use std::time::Duration;

use virtual_authenticator::RelyingParty;

use crate::errors::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scenario {
    Register,
    Login,
    Ping,
}

impl FromStr for Scenario {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "register" => Ok(Self::Register),
            "login" => Ok(Self::Login),
            "ping" => Ok(Self::Ping),
            other => Err(LoadError::Config(format!(
                "Unknown scenario {other:?}, expected register, login or ping"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LoadConfig {
    pub(crate) base_url: String,
    pub(crate) scenario: Scenario,
    pub(crate) vus: usize,
    pub(crate) duration: Duration,
    pub(crate) rp: RelyingParty,
}

impl LoadConfig {
    pub(crate) fn from_env() -> Result<Self, LoadError> {
        let base_url = env_or("LOADTEST_BASE_URL", "http://localhost:8080")
            .trim_end_matches('/')
            .to_string();
        let scenario = env_or("LOADTEST_SCENARIO", "login").parse()?;
        let vus = parse_env("LOADTEST_VUS", 10usize)?;
        let duration = Duration::from_secs(parse_env("LOADTEST_DURATION", 30u64)?);

        if vus == 0 {
            return Err(LoadError::Config("LOADTEST_VUS must be positive".to_string()));
        }

        let rp = RelyingParty::new(
            env_or("LOADTEST_RP_NAME", "Passkey Demo"),
            env_or("LOADTEST_RP_ID", "localhost"),
            env_or("LOADTEST_ORIGIN", &base_url),
        );

        Ok(Self {
            base_url,
            scenario,
            vus,
            duration,
            rp,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, LoadError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| LoadError::Config(format!("Invalid {name}: {value:?}"))),
        Err(_) => Ok(default),
    }
}
