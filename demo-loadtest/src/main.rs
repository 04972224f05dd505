//! Load generator for the passkey ceremony server.
//!
//! Each virtual user loops over one scenario until the configured duration
//! has elapsed; per-step counts, failures and mean latency are reported at
//! the end.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use virtual_authenticator::{Credential, create_credential};

mod client;
mod config;
mod errors;
mod stats;

use client::CeremonyClient;
use config::{LoadConfig, Scenario};
use errors::LoadError;
use stats::{Stats, Step};

/// Login state owned by one virtual user.
///
/// Every VU registers its own credential: finish requests from different VUs
/// reach the server in any order, so a shared counter would regress.
#[derive(Debug)]
struct LoginFixture {
    username: String,
    user_handle: String,
    credential: Credential,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "demo_loadtest=info,info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn random_username() -> String {
    format!("loadtest-{}", Uuid::new_v4().simple())
}

async fn setup_login(client: &CeremonyClient) -> Result<LoginFixture, LoadError> {
    let username = random_username();
    let credential = create_credential()?;
    let user_handle = client.register(&username, &credential).await?;
    tracing::debug!("Registered {} for the login scenario", username);
    Ok(LoginFixture {
        username,
        user_handle,
        credential,
    })
}

async fn iteration(
    client: &CeremonyClient,
    scenario: Scenario,
    fixture: Option<&LoginFixture>,
) -> Result<(), LoadError> {
    match (scenario, fixture) {
        (Scenario::Register, _) => {
            let credential = create_credential()?;
            client.register(&random_username(), &credential).await?;
            Ok(())
        }
        (Scenario::Login, Some(fixture)) => {
            client
                .login(&fixture.username, &fixture.user_handle, &fixture.credential)
                .await
        }
        (Scenario::Login, None) => Err(LoadError::Config(
            "login scenario requires a registered user".to_string(),
        )),
        (Scenario::Ping, _) => client.ping().await,
    }
}

async fn virtual_user(
    id: usize,
    client: CeremonyClient,
    scenario: Scenario,
    fixture: Option<LoginFixture>,
    deadline: Instant,
) {
    while Instant::now() < deadline {
        let start = Instant::now();
        let result = iteration(&client, scenario, fixture.as_ref()).await;
        client
            .stats()
            .record(Step::Iteration, start.elapsed(), result.is_ok());
        if let Err(e) = result {
            tracing::debug!("VU {} iteration failed: {}", id, e);
        }
    }
}

/// Runs `vus` virtual users for `duration` and returns the measured run time.
/// The login scenario registers one fixture per VU before the clock starts.
async fn run_virtual_users(
    client: &CeremonyClient,
    scenario: Scenario,
    vus: usize,
    duration: Duration,
) -> Result<Duration, LoadError> {
    let mut fixtures = Vec::with_capacity(vus);
    for _ in 0..vus {
        fixtures.push(match scenario {
            Scenario::Login => Some(setup_login(client).await?),
            _ => None,
        });
    }
    if scenario == Scenario::Login {
        tracing::info!("Registered {} users for the login scenario", vus);
    }

    let started = Instant::now();
    let deadline = started + duration;
    let handles: Vec<_> = fixtures
        .into_iter()
        .enumerate()
        .map(|(id, fixture)| {
            tokio::spawn(virtual_user(id, client.clone(), scenario, fixture, deadline))
        })
        .collect();

    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!("Virtual user task failed: {}", e);
        }
    }
    Ok(started.elapsed())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = LoadConfig::from_env()?;
    tracing::info!(
        "Running {:?} with {} VUs for {}s against {}",
        config.scenario,
        config.vus,
        config.duration.as_secs(),
        config.base_url
    );

    let stats = Arc::new(Stats::default());
    let client = CeremonyClient::new(config.base_url.clone(), config.rp.clone(), stats.clone());

    let elapsed = run_virtual_users(&client, config.scenario, config.vus, config.duration).await?;

    stats.report(elapsed.max(Duration::from_millis(1)));
    Ok(())
}
