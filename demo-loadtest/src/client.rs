use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use virtual_authenticator::{
    Credential, RelyingParty, create_assertion_response, create_attestation_response,
};

use crate::errors::LoadError;
use crate::stats::{Stats, Step};

/// HTTP client for one relying party, recording every step into `stats`.
#[derive(Debug, Clone)]
pub(crate) struct CeremonyClient {
    http: reqwest::Client,
    base_url: String,
    rp: RelyingParty,
    stats: Arc<Stats>,
}

impl CeremonyClient {
    pub(crate) fn new(base_url: String, rp: RelyingParty, stats: Arc<Stats>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            rp,
            stats,
        }
    }

    pub(crate) fn stats(&self) -> &Stats {
        &self.stats
    }

    async fn timed<T>(
        &self,
        step: Step,
        fut: impl Future<Output = Result<T, LoadError>>,
    ) -> Result<T, LoadError> {
        let start = Instant::now();
        let result = fut.await;
        self.stats.record(step, start.elapsed(), result.is_ok());
        result
    }

    async fn send(
        &self,
        step: Step,
        request: reqwest::RequestBuilder,
    ) -> Result<String, LoadError> {
        self.timed(step, fetch(step, request)).await
    }

    async fn get(&self, step: Step, path: &str) -> Result<String, LoadError> {
        let request = self.http.get(format!("{}{}", self.base_url, path));
        self.send(step, request).await
    }

    async fn post(&self, step: Step, path: &str, body: String) -> Result<String, LoadError> {
        let request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.send(step, request).await
    }

    /// Registers `credential` for `username` and returns the user handle the
    /// server assigned.
    pub(crate) async fn register(
        &self,
        username: &str,
        credential: &Credential,
    ) -> Result<String, LoadError> {
        let options = self
            .get(Step::RegisterStart, &format!("/register/start/{username}"))
            .await?;

        let user_handle = serde_json::from_str::<Value>(&options)
            .map_err(|e| LoadError::Response(e.to_string()))?["user"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LoadError::Response("registration options lack user.id".into()))?;

        let attestation = create_attestation_response(&self.rp, credential, &options)?;
        self.post(
            Step::RegisterFinish,
            &format!("/register/finish/{username}"),
            attestation,
        )
        .await?;

        Ok(user_handle)
    }

    pub(crate) async fn login(
        &self,
        username: &str,
        user_handle: &str,
        credential: &Credential,
    ) -> Result<(), LoadError> {
        let options = self
            .get(Step::LoginStart, &format!("/login/start/{username}"))
            .await?;

        let assertion = create_assertion_response(&self.rp, credential, user_handle, &options)?;
        self.post(
            Step::LoginFinish,
            &format!("/login/finish/{username}"),
            assertion,
        )
        .await?;

        Ok(())
    }

    pub(crate) async fn ping(&self) -> Result<(), LoadError> {
        let body = self.get(Step::Ping, "/ping").await?;
        if body != "pong" {
            return Err(LoadError::Response(format!("unexpected ping body {body:?}")));
        }
        Ok(())
    }
}

async fn fetch(step: Step, request: reqwest::RequestBuilder) -> Result<String, LoadError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(LoadError::Status {
            step: step.as_str(),
            status,
            body,
        });
    }
    Ok(body)
}
