use crate::common::*;
use passkey_ceremony::CoordinationError;
use virtual_authenticator::{Authenticator, AuthenticatorOptions, Credential};

#[tokio::test]
async fn test_alice_registers_and_logs_in() {
    // Given alice registered with a fresh authenticator
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let (_, handle) = register(&coordinator, "alice", &credential).await.unwrap();

    // When she logs in twice
    let first = login(&coordinator, "alice", &handle, &credential).await.unwrap();
    let second = login(&coordinator, "alice", &handle, &credential).await.unwrap();

    // Then each login advances the stored counter
    assert_eq!(first.credential_id, credential.id_base64());
    assert_eq!(first.sign_count, 1);
    assert_eq!(second.sign_count, 2);

    let user = coordinator.user_store().get_user("alice").await.unwrap().unwrap();
    let stored = user.find_credential(&credential.id_base64()).unwrap();
    assert_eq!(stored.sign_count, 2);
    assert!(stored.last_used_at >= stored.created_at);
    assert!(coordinator.session_store().is_empty().await.unwrap());
}

#[tokio::test]
async fn test_login_without_user_handle() {
    // Given alice registered
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    register(&coordinator, "alice", &credential).await.unwrap();

    // When the authenticator leaves userHandle out of its assertion
    let options = coordinator.begin_login("alice").await.unwrap();
    let response = assert_with(&authenticator_for(""), &relying_party(), &credential, &options);
    assert!(response.response.user_handle.is_none());
    let outcome = coordinator.finish_login("alice", response).await;

    // Then the login is accepted
    assert_eq!(outcome.unwrap().sign_count, 1);
}

#[tokio::test]
async fn test_login_with_empty_user_handle_is_rejected() {
    // Given alice registered
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    register(&coordinator, "alice", &credential).await.unwrap();

    // When the assertion carries an explicit empty userHandle
    let options = coordinator.begin_login("alice").await.unwrap();
    let authenticator = Authenticator::with_options(AuthenticatorOptions {
        user_handle: Some(String::new()),
        ..AuthenticatorOptions::default()
    });
    let response = assert_with(&authenticator, &relying_party(), &credential, &options);
    let outcome = coordinator.finish_login("alice", response).await;

    // Then it does not match the stored handle
    assert!(matches!(outcome, Err(CoordinationError::AssertionInvalid(_))));
}

#[tokio::test]
async fn test_login_replay_is_rejected() {
    // Given a completed login
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let (_, handle) = register(&coordinator, "alice", &credential).await.unwrap();
    let options = coordinator.begin_login("alice").await.unwrap();
    let response = assert_with(&authenticator_for(&handle), &relying_party(), &credential, &options);
    coordinator
        .finish_login("alice", response.clone())
        .await
        .unwrap();

    // When the same assertion is replayed
    let replay = coordinator.finish_login("alice", response).await;

    // Then the challenge is gone
    assert!(matches!(replay, Err(CoordinationError::SessionNotFound)));
}

#[tokio::test]
async fn test_cloned_authenticator_counter_regression() {
    // Given alice logged in once (stored counter 1)
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let (_, handle) = register(&coordinator, "alice", &credential).await.unwrap();
    login(&coordinator, "alice", &handle, &credential).await.unwrap();

    // When a clone still at counter 0 signs
    let clone = credential.clone();
    clone.set_counter(0);
    let result = login(&coordinator, "alice", &handle, &clone).await;

    // Then the counter regression is reported and nothing is updated
    assert!(matches!(
        result,
        Err(CoordinationError::CounterRegression {
            stored: 1,
            received: 1
        })
    ));
    let user = coordinator.user_store().get_user("alice").await.unwrap().unwrap();
    assert_eq!(user.find_credential(&credential.id_base64()).unwrap().sign_count, 1);

    // And the original authenticator keeps working
    let outcome = login(&coordinator, "alice", &handle, &credential).await.unwrap();
    assert_eq!(outcome.sign_count, 2);
}

#[tokio::test]
async fn test_out_of_order_assertions() {
    // Given two logins begun for the same credential
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let (_, handle) = register(&coordinator, "alice", &credential).await.unwrap();
    let authenticator = authenticator_for(&handle);

    let first_options = coordinator.begin_login("alice").await.unwrap();
    let second_options = coordinator.begin_login("alice").await.unwrap();
    let first = assert_with(&authenticator, &relying_party(), &credential, &first_options);
    let second = assert_with(&authenticator, &relying_party(), &credential, &second_options);

    // When the later assertion (counter 2) lands first
    let outcome = coordinator.finish_login("alice", second).await.unwrap();
    assert_eq!(outcome.sign_count, 2);

    // Then the earlier one (counter 1) is a regression
    let result = coordinator.finish_login("alice", first).await;
    assert!(matches!(
        result,
        Err(CoordinationError::CounterRegression {
            stored: 2,
            received: 1
        })
    ));
}

#[tokio::test]
async fn test_counterless_authenticator() {
    // Given an authenticator that always reports 0
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let options = AuthenticatorOptions {
        reports_counter: false,
        ..AuthenticatorOptions::default()
    };
    let (_, handle) = register_with(
        &coordinator,
        &Authenticator::with_options(options.clone()),
        "alice",
        &credential,
    )
    .await
    .unwrap();

    let authenticator = Authenticator::with_options(AuthenticatorOptions {
        user_handle: Some(handle),
        ..options
    });

    // When alice logs in repeatedly
    for _ in 0..3 {
        let login_options = coordinator.begin_login("alice").await.unwrap();
        let response = assert_with(&authenticator, &relying_party(), &credential, &login_options);
        let outcome = coordinator.finish_login("alice", response).await.unwrap();

        // Then the counter check is skipped
        assert_eq!(outcome.sign_count, 0);
    }
}

#[tokio::test]
async fn test_login_wrong_origin() {
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let (_, handle) = register(&coordinator, "alice", &credential).await.unwrap();

    let options = coordinator.begin_login("alice").await.unwrap();
    let response = assert_with(&authenticator_for(&handle), &phishing_party(), &credential, &options);
    let result = coordinator.finish_login("alice", response).await;

    assert!(matches!(result, Err(CoordinationError::AssertionInvalid(_))));
    let user = coordinator.user_store().get_user("alice").await.unwrap().unwrap();
    assert_eq!(user.find_credential(&credential.id_base64()).unwrap().sign_count, 0);
}

#[tokio::test]
async fn test_login_user_handle_mismatch() {
    // Given alice and bob both registered
    let coordinator = coordinator();
    let alice_key = Credential::new().unwrap();
    let bob_key = Credential::new().unwrap();
    register(&coordinator, "alice", &alice_key).await.unwrap();
    let (_, bob_handle) = register(&coordinator, "bob", &bob_key).await.unwrap();

    // When alice's credential answers with bob's handle
    let result = login(&coordinator, "alice", &bob_handle, &alice_key).await;

    // Then the assertion is rejected
    assert!(matches!(result, Err(CoordinationError::AssertionInvalid(_))));
}

#[tokio::test]
async fn test_login_with_credential_not_offered() {
    // Given alice and bob both registered
    let coordinator = coordinator();
    let alice_key = Credential::new().unwrap();
    let bob_key = Credential::new().unwrap();
    let (_, alice_handle) = register(&coordinator, "alice", &alice_key).await.unwrap();
    register(&coordinator, "bob", &bob_key).await.unwrap();

    // When alice's login is answered by bob's credential
    let result = login(&coordinator, "alice", &alice_handle, &bob_key).await;

    // Then it is rejected
    assert!(matches!(result, Err(CoordinationError::AssertionInvalid(_))));
}

#[tokio::test]
async fn test_login_tampered_signature() {
    let coordinator = coordinator();
    let credential = Credential::new().unwrap();
    let (_, handle) = register(&coordinator, "alice", &credential).await.unwrap();

    let options = coordinator.begin_login("alice").await.unwrap();
    let mut response = assert_with(&authenticator_for(&handle), &relying_party(), &credential, &options);
    let other = Credential::new().unwrap();
    let forged = assert_with(&authenticator_for(&handle), &relying_party(), &other, &options);
    response.response.signature = forged.response.signature;

    let result = coordinator.finish_login("alice", response).await;

    assert!(matches!(result, Err(CoordinationError::AssertionInvalid(_))));
}

#[tokio::test]
async fn test_login_unknown_user() {
    let coordinator = coordinator();
    let result = coordinator.begin_login("nobody").await;
    assert!(matches!(result, Err(CoordinationError::UserNotFound(_))));
}

#[tokio::test]
async fn test_expired_login_session() {
    let coordinator = coordinator_with_challenge_timeout(std::time::Duration::from_millis(250));
    let credential = Credential::new().unwrap();
    let (_, handle) = register(&coordinator, "alice", &credential).await.unwrap();

    let options = coordinator.begin_login("alice").await.unwrap();
    let response = assert_with(&authenticator_for(&handle), &relying_party(), &credential, &options);
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let result = coordinator.finish_login("alice", response).await;
    assert!(matches!(result, Err(CoordinationError::SessionNotFound)));
}
