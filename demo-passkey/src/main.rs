use std::sync::Arc;

use passkey_ceremony::{CeremonyConfig, Coordinator, spawn_session_reaper};
use passkey_ceremony_axum::passkey_ceremony_router;

mod server;

use server::{init_tracing, listen_addr, reap_interval, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("demo_passkey");

    let config = CeremonyConfig::from_env()?;
    tracing::info!(
        "Relying party {} ({}) at {}",
        config.rp_name,
        config.rp_id,
        config.origin
    );

    let coordinator = Arc::new(Coordinator::in_memory(config));
    let reaper = spawn_session_reaper(coordinator.session_store(), reap_interval());

    let app = passkey_ceremony_router(coordinator);

    let addr = listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper.abort();
    Ok(())
}
