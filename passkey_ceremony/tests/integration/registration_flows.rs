use crate::common::*;
use passkey_ceremony::{CoordinationError, CorrelationKey, RegistrationPolicy};
use virtual_authenticator::{
    AttestationFormat, Authenticator, AuthenticatorOptions, Credential, ICLOUD_KEYCHAIN_AAGUID,
};

#[tokio::test]
async fn test_register_new_user() {
    // Given an empty relying party and a fresh credential
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();

    // When alice registers
    let (outcome, user_handle) = register(&coordinator, "alice", &credential)
        .await
        .expect("registration succeeds");

    // Then the credential is stored with the authenticator's properties
    assert_eq!(outcome.credential_id, credential.id_base64());
    assert_eq!(outcome.credential_count, 1);

    let user = coordinator
        .user_store()
        .get_user("alice")
        .await
        .unwrap()
        .expect("alice exists");
    assert_eq!(user.handle, user_handle);

    let stored = user
        .find_credential(&credential.id_base64())
        .expect("credential stored");
    assert_eq!(stored.sign_count, 0);
    assert_eq!(stored.aaguid, ICLOUD_KEYCHAIN_AAGUID.hyphenated().to_string());
    assert!(stored.backup_eligible);
    assert!(stored.backup_state);

    // And the ceremony session is gone
    assert!(coordinator.session_store().is_empty().await.unwrap());
}

#[tokio::test]
async fn test_register_with_none_attestation() {
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let authenticator = Authenticator::with_options(AuthenticatorOptions {
        attestation_format: AttestationFormat::None,
        ..AuthenticatorOptions::default()
    });

    let (outcome, _) = register_with(&coordinator, &authenticator, "alice", &credential)
        .await
        .expect("none attestation is accepted");

    assert_eq!(outcome.credential_count, 1);
}

#[tokio::test]
async fn test_register_second_credential_for_existing_user() {
    // Given alice with one credential
    let coordinator = coordinator();
    let first = Credential::new().unwrap();
    let (_, handle) = register(&coordinator, "alice", &first).await.unwrap();

    // When she enrols a second authenticator
    let second = Credential::new().unwrap();
    let (outcome, second_handle) = register(&coordinator, "alice", &second).await.unwrap();

    // Then both are stored under the same user handle
    assert_eq!(outcome.credential_count, 2);
    assert_eq!(handle, second_handle);
}

#[tokio::test]
async fn test_register_replay_is_rejected() {
    // Given a completed registration
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let options = coordinator.begin_registration("alice").await.unwrap();
    let reg_data = attest(&Authenticator::new(), &relying_party(), &credential, &options);
    coordinator
        .finish_registration("alice", reg_data.clone())
        .await
        .unwrap();

    // When the same response is submitted again
    let replay = coordinator.finish_registration("alice", reg_data).await;

    // Then the challenge is unknown
    assert!(matches!(replay, Err(CoordinationError::SessionNotFound)));
}

#[tokio::test]
async fn test_register_excluded_credential_is_rejected() {
    // Given alice already holds a credential
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    register(&coordinator, "alice", &credential).await.unwrap();

    // When she begins again, the options exclude it
    let options = coordinator.begin_registration("alice").await.unwrap();
    let excluded: Vec<_> = options
        .exclude_credentials
        .iter()
        .map(|c| c.id.clone())
        .collect();
    assert_eq!(excluded, vec![credential.id_base64()]);

    // And re-registering the same authenticator fails
    let reg_data = attest(&Authenticator::new(), &relying_party(), &credential, &options);
    let result = coordinator.finish_registration("alice", reg_data).await;
    assert!(matches!(result, Err(CoordinationError::AttestationInvalid(_))));

    let user = coordinator.user_store().get_user("alice").await.unwrap().unwrap();
    assert_eq!(user.credentials.len(), 1);
}

#[tokio::test]
async fn test_credential_id_cannot_move_between_users() {
    // Given alice owns a credential
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    register(&coordinator, "alice", &credential).await.unwrap();

    // When bob registers the same authenticator
    let result = register(&coordinator, "bob", &credential).await;

    // Then it is refused and stays alice's
    assert!(matches!(result, Err(CoordinationError::AttestationInvalid(_))));
    let owner = coordinator
        .user_store()
        .credential_owner(&credential.id_base64())
        .await
        .unwrap();
    assert_eq!(owner.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_deleted_user_releases_credential() {
    // Given alice owns a credential and an administrator removes her
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    register(&coordinator, "alice", &credential).await.unwrap();
    coordinator.user_store().delete_user("alice").await.unwrap();

    // When bob registers the same authenticator
    let (outcome, _) = register(&coordinator, "bob", &credential).await.unwrap();

    // Then the credential is now bob's
    assert_eq!(outcome.credential_count, 1);
    let owner = coordinator
        .user_store()
        .credential_owner(&credential.id_base64())
        .await
        .unwrap();
    assert_eq!(owner.as_deref(), Some("bob"));
    assert!(coordinator.user_store().get_user("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn test_register_wrong_origin_is_rejected() {
    // Given a registration started for alice
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let options = coordinator.begin_registration("alice").await.unwrap();

    // When the response is produced on another origin
    let reg_data = attest(&Authenticator::new(), &phishing_party(), &credential, &options);
    let result = coordinator.finish_registration("alice", reg_data).await;

    // Then attestation fails and nothing is stored
    assert!(matches!(result, Err(CoordinationError::AttestationInvalid(_))));
    let user = coordinator.user_store().get_user("alice").await.unwrap().unwrap();
    assert!(user.credentials.is_empty());

    // And the challenge cannot be retried
    let retry = attest(&Authenticator::new(), &relying_party(), &credential, &options);
    let result = coordinator.finish_registration("alice", retry).await;
    assert!(matches!(result, Err(CoordinationError::SessionNotFound)));
}

#[tokio::test]
async fn test_register_without_user_presence_is_rejected() {
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let authenticator = Authenticator::with_options(AuthenticatorOptions {
        user_present: false,
        ..AuthenticatorOptions::default()
    });

    let result = register_with(&coordinator, &authenticator, "alice", &credential).await;

    assert!(matches!(result, Err(CoordinationError::AttestationInvalid(_))));
}

#[tokio::test]
async fn test_register_other_users_challenge_is_rejected() {
    // Given registrations started for alice and bob
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let alice_options = coordinator.begin_registration("alice").await.unwrap();
    coordinator.begin_registration("bob").await.unwrap();

    // When bob finishes with a response to alice's challenge
    let reg_data = attest(&Authenticator::new(), &relying_party(), &credential, &alice_options);
    let result = coordinator.finish_registration("bob", reg_data.clone()).await;

    // Then there is no session for bob, and alice's challenge is spent
    assert!(matches!(result, Err(CoordinationError::SessionNotFound)));
    let result = coordinator.finish_registration("alice", reg_data).await;
    assert!(matches!(result, Err(CoordinationError::SessionNotFound)));
}

#[tokio::test]
async fn test_new_users_only_policy() {
    // Given a relying party that refuses existing users
    let coordinator = coordinator_with_policy(RegistrationPolicy::NewUsersOnly);
    let credential = Credential::new().unwrap();

    // When alice registers, then tries to begin again
    register(&coordinator, "alice", &credential).await.unwrap();
    let again = coordinator.begin_registration("alice").await;

    // Then the second attempt is refused without a session
    assert!(matches!(again, Err(CoordinationError::AlreadyExists(_))));
    assert!(coordinator.session_store().is_empty().await.unwrap());
}

#[tokio::test]
async fn test_expired_registration_session() {
    // Given a very short challenge lifetime
    let coordinator = coordinator_with_challenge_timeout(std::time::Duration::from_millis(50));
    let credential = Credential::new().unwrap();
    let options = coordinator.begin_registration("alice").await.unwrap();
    let reg_data = attest(&Authenticator::new(), &relying_party(), &credential, &options);

    // When the response arrives after expiry
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    let result = coordinator.finish_registration("alice", reg_data).await;

    // Then it is indistinguishable from a missing session
    assert!(matches!(result, Err(CoordinationError::SessionNotFound)));
    assert!(
        coordinator
            .session_store()
            .get(&CorrelationKey::registration(&options.challenge))
            .await
            .unwrap()
            .is_none()
    );
}
