use std::sync::Arc;

use crate::common::*;
use passkey_ceremony::{CoordinationError, spawn_session_reaper};
use virtual_authenticator::{Authenticator, Credential};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_finish_login_single_winner() {
    // Given one assertion for one live challenge
    let coordinator = Arc::new(coordinator());
    let credential = Credential::new().unwrap();
    let (_, handle) = register(&coordinator, "alice", &credential).await.unwrap();
    let options = coordinator.begin_login("alice").await.unwrap();
    let response = assert_with(&authenticator_for(&handle), &relying_party(), &credential, &options);

    // When it is submitted by many tasks at once
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let coordinator = coordinator.clone();
            let response = response.clone();
            tokio::spawn(async move { coordinator.finish_login("alice", response).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                assert_eq!(outcome.sign_count, 1);
                successes += 1;
            }
            Err(e) => assert!(matches!(e, CoordinationError::SessionNotFound)),
        }
    }

    // Then exactly one consumed the challenge
    assert_eq!(successes, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_finish_registration_single_winner() {
    let coordinator = Arc::new(coordinator());
    let credential = Credential::new().unwrap();
    let options = coordinator.begin_registration("alice").await.unwrap();
    let reg_data = attest(&Authenticator::new(), &relying_party(), &credential, &options);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let coordinator = coordinator.clone();
            let reg_data = reg_data.clone();
            tokio::spawn(async move { coordinator.finish_registration("alice", reg_data).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    let user = coordinator.user_store().get_user("alice").await.unwrap().unwrap();
    assert_eq!(user.credentials.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_shared_credential() {
    // Given one credential shared by several workers
    let coordinator = Arc::new(coordinator());
    let credential = Arc::new(Credential::new().unwrap());
    let (_, handle) = register(&coordinator, "alice", &credential).await.unwrap();

    // When each worker completes its own login ceremony
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = coordinator.clone();
            let credential = credential.clone();
            let handle = handle.clone();
            tokio::spawn(async move { login(&coordinator, "alice", &handle, &credential).await })
        })
        .collect();

    let mut accepted = Vec::new();
    for task in handles {
        match task.await.unwrap() {
            Ok(outcome) => accepted.push(outcome.sign_count),
            // Another worker's assertion advanced the counter first
            Err(CoordinationError::CounterRegression { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    // Then every accepted counter is distinct, and the store holds the highest
    accepted.sort_unstable();
    let before = accepted.len();
    accepted.dedup();
    assert_eq!(before, accepted.len());
    assert!(!accepted.is_empty());

    let user = coordinator.user_store().get_user("alice").await.unwrap().unwrap();
    let stored = user.find_credential(&credential.id_base64()).unwrap().sign_count;
    assert_eq!(Some(&stored), accepted.last());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_login_loops_with_own_credentials() {
    // Given ten workers, each registered with its own credential
    let coordinator = Arc::new(coordinator());
    let mut workers = Vec::new();
    for i in 0..10 {
        let name = format!("user{i}");
        let credential = Credential::new().unwrap();
        let (_, handle) = register(&coordinator, &name, &credential).await.unwrap();
        workers.push((name, handle, credential));
    }

    // When every worker loops over fifty logins concurrently
    let tasks: Vec<_> = workers
        .into_iter()
        .map(|(name, handle, credential)| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    login(&coordinator, &name, &handle, &credential).await?;
                }
                Ok::<_, CoordinationError>((name, credential))
            })
        })
        .collect();

    // Then no honest login fails and each counter reached 50
    for task in tasks {
        let (name, credential) = task.await.unwrap().unwrap();
        let user = coordinator.user_store().get_user(&name).await.unwrap().unwrap();
        let stored = user.find_credential(&credential.id_base64()).unwrap();
        assert_eq!(stored.sign_count, 50);
    }
}

#[tokio::test]
async fn test_reaper_purges_abandoned_ceremonies() {
    // Given abandoned registrations with a short lifetime
    let coordinator = coordinator_with_challenge_timeout(std::time::Duration::from_millis(100));
    for name in ["alice", "bob", "carol"] {
        coordinator.begin_registration(name).await.unwrap();
    }
    assert_eq!(coordinator.session_store().len().await.unwrap(), 3);

    // When the reaper runs after they expire
    let reaper = spawn_session_reaper(
        coordinator.session_store(),
        std::time::Duration::from_millis(50),
    );
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    reaper.abort();

    // Then the store is empty
    assert!(coordinator.session_store().is_empty().await.unwrap());
}
