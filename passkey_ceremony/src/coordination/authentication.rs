use crate::passkey::{
    AuthenticationOptions, AuthenticatorResponse, ParsedClientData, counter_advances,
    create_authentication_options, verify_assertion,
};
use crate::storage::{CeremonyKind, CorrelationKey};
use crate::utils::gen_random_string;

use super::ceremony::{AuthenticationOutcome, Coordinator, validate_username};
use super::errors::CoordinationError;

const CHALLENGE_LEN: usize = 32;

impl Coordinator {
    /// Starts an authentication ceremony for `username`.
    pub async fn begin_login(
        &self,
        username: &str,
    ) -> Result<AuthenticationOptions, CoordinationError> {
        let username = validate_username(username)?;

        let user = self
            .user_store()
            .get_user(username)
            .await?
            .ok_or_else(|| CoordinationError::UserNotFound(username.to_string()).log())?;

        if user.credentials.is_empty() {
            return Err(CoordinationError::UserNotFound(format!(
                "{username} has no registered credentials"
            ))
            .log());
        }

        let challenge = gen_random_string(CHALLENGE_LEN)?;
        let allow_credentials = user.credential_ids();

        let session = self.new_session(
            CeremonyKind::Authentication,
            &challenge,
            &user,
            Vec::new(),
            allow_credentials.clone(),
        )?;
        self.store_session(session).await?;

        Ok(create_authentication_options(
            self.config(),
            challenge,
            &allow_credentials,
        ))
    }

    /// Completes an authentication ceremony and advances the credential's
    /// sign counter.
    pub async fn finish_login(
        &self,
        username: &str,
        auth_response: AuthenticatorResponse,
    ) -> Result<AuthenticationOutcome, CoordinationError> {
        let username = validate_username(username)?;

        let user = self
            .user_store()
            .get_user(username)
            .await?
            .ok_or_else(|| CoordinationError::UserNotFound(username.to_string()).log())?;

        let client_data = ParsedClientData::from_base64(&auth_response.response.client_data_json)
            .map_err(|e| CoordinationError::BadRequest(e.to_string()).log())?;

        tracing::debug!("Parsed client data: {:?}", client_data);

        let session = self
            .take_session(CorrelationKey::authentication(&client_data.challenge), &user)
            .await?;

        if !client_data.challenge_matches(&session.challenge) {
            return Err(CoordinationError::ChallengeMismatch.log());
        }

        if !session.allow_credentials.contains(&auth_response.id) {
            return Err(CoordinationError::AssertionInvalid(format!(
                "credential {} was not offered for this ceremony",
                auth_response.id
            ))
            .log());
        }

        let stored = user.find_credential(&auth_response.id).ok_or_else(|| {
            CoordinationError::AssertionInvalid(format!(
                "credential {} is not registered to {}",
                auth_response.id, username
            ))
            .log()
        })?;

        let auth_data = verify_assertion(
            self.config(),
            &auth_response,
            &client_data,
            &stored.public_key,
            &user.handle,
            session.user_verification,
        )
        .map_err(|e| CoordinationError::AssertionInvalid(e.to_string()).log())?;

        let received = auth_data.counter;
        if !counter_advances(stored.sign_count, received) {
            return Err(CoordinationError::CounterRegression {
                stored: stored.sign_count,
                received,
            }
            .log());
        }

        let swapped = self
            .user_store()
            .compare_and_swap_sign_count(username, &stored.credential_id, stored.sign_count, received)
            .await?;

        if !swapped {
            // Another login with the same credential advanced the counter first
            let current = self
                .user_store()
                .get_user(username)
                .await?
                .and_then(|u| u.find_credential(&stored.credential_id).map(|c| c.sign_count))
                .unwrap_or(stored.sign_count);
            return Err(CoordinationError::CounterRegression {
                stored: current,
                received,
            }
            .log());
        }

        tracing::info!(
            "User {} authenticated with credential {} (counter {})",
            username,
            stored.credential_id,
            received
        );

        Ok(AuthenticationOutcome {
            credential_id: stored.credential_id.clone(),
            sign_count: received,
        })
    }
}
