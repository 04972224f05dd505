use crate::config::RegistrationPolicy;
use crate::passkey::{
    ParsedClientData, PublicKeyCredentialUserEntity, RegisterCredential, RegistrationOptions,
    VerifiedCredential, create_registration_options, verify_registration,
};
use crate::storage::{CeremonyKind, CorrelationKey, StorageError};
use crate::userdb::{RegisteredCredential, User};
use crate::utils::gen_random_string;

use super::ceremony::{Coordinator, RegistrationOutcome, validate_username};
use super::errors::CoordinationError;

const USER_HANDLE_LEN: usize = 32;
const CHALLENGE_LEN: usize = 32;

/// Per-request registration options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationRequestOptions {
    /// Credential IDs the authenticator must not re-register
    pub exclude_credentials: Vec<String>,
}

impl RegistrationRequestOptions {
    pub fn for_user(user: &User) -> Self {
        Self {
            exclude_credentials: user.credential_ids(),
        }
    }
}

impl Coordinator {
    /// Starts a registration ceremony for `username`.
    pub async fn begin_registration(
        &self,
        username: &str,
    ) -> Result<RegistrationOptions, CoordinationError> {
        let username = validate_username(username)?;

        let candidate = User::new(username, gen_random_string(USER_HANDLE_LEN)?);
        let (user, created) = self.user_store().create_user_if_absent(candidate).await?;

        match (self.config().registration_policy, created) {
            (_, true) => tracing::info!("Created user {}", username),
            (RegistrationPolicy::NewUsersOnly, false) => {
                return Err(CoordinationError::AlreadyExists(username.to_string()).log());
            }
            (RegistrationPolicy::AutoCreate, false) => {
                tracing::debug!(
                    "Enrolling an additional credential for {} ({} existing)",
                    username,
                    user.credentials.len()
                );
            }
        }

        let request = RegistrationRequestOptions::for_user(&user);
        self.begin_registration_with(&user, request).await
    }

    /// Starts a registration ceremony for an existing user with explicit
    /// request options.
    pub async fn begin_registration_with(
        &self,
        user: &User,
        request: RegistrationRequestOptions,
    ) -> Result<RegistrationOptions, CoordinationError> {
        let challenge = gen_random_string(CHALLENGE_LEN)?;

        let session = self.new_session(
            CeremonyKind::Registration,
            &challenge,
            user,
            request.exclude_credentials.clone(),
            Vec::new(),
        )?;
        self.store_session(session).await?;

        let entity = PublicKeyCredentialUserEntity {
            id: user.handle.clone(),
            name: user.name.clone(),
            display_name: user.display_name.clone(),
        };

        Ok(create_registration_options(
            self.config(),
            challenge,
            entity,
            &request.exclude_credentials,
        ))
    }

    /// Completes a registration ceremony and stores the new credential.
    pub async fn finish_registration(
        &self,
        username: &str,
        reg_data: RegisterCredential,
    ) -> Result<RegistrationOutcome, CoordinationError> {
        let username = validate_username(username)?;

        let user = self
            .user_store()
            .get_user(username)
            .await?
            .ok_or_else(|| CoordinationError::UserNotFound(username.to_string()).log())?;

        let client_data = ParsedClientData::from_base64(&reg_data.response.client_data_json)
            .map_err(|e| CoordinationError::BadRequest(e.to_string()).log())?;

        tracing::debug!("Parsed client data: {:?}", client_data);

        let session = self
            .take_session(CorrelationKey::registration(&client_data.challenge), &user)
            .await?;

        if !client_data.challenge_matches(&session.challenge) {
            return Err(CoordinationError::ChallengeMismatch.log());
        }

        let verified = verify_registration(
            self.config(),
            &reg_data,
            &client_data,
            session.user_verification,
        )
        .map_err(|e| CoordinationError::AttestationInvalid(e.to_string()).log())?;

        if session.exclude_credentials.contains(&verified.credential_id) {
            return Err(CoordinationError::AttestationInvalid(format!(
                "credential {} is already registered",
                verified.credential_id
            ))
            .log());
        }

        let credential_id = verified.credential_id.clone();
        let credential_count = match self
            .user_store()
            .add_credential(username, registered_credential(verified))
            .await
        {
            Ok(count) => count,
            Err(StorageError::Conflict(msg)) => {
                return Err(CoordinationError::AttestationInvalid(msg).log());
            }
            Err(StorageError::NotFound(_)) => {
                return Err(CoordinationError::UserNotFound(username.to_string()).log());
            }
            Err(e) => return Err(CoordinationError::from(e).log()),
        };

        tracing::info!(
            "Registered credential {} for {} ({} total)",
            credential_id,
            username,
            credential_count
        );

        Ok(RegistrationOutcome {
            credential_id,
            credential_count,
        })
    }
}

fn registered_credential(verified: VerifiedCredential) -> RegisteredCredential {
    let now = chrono::Utc::now();
    RegisteredCredential {
        credential_id: verified.credential_id,
        public_key: verified.public_key,
        sign_count: verified.sign_count,
        aaguid: verified.aaguid,
        backup_eligible: verified.backup_eligible,
        backup_state: verified.backup_state,
        created_at: now,
        last_used_at: now,
    }
}
