use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REAP_INTERVAL_SECS: u64 = 30;

pub(crate) fn init_tracing(app_name: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        {
            format!(
                "passkey_ceremony_axum=debug,passkey_ceremony=debug,{}=debug,tower_http=info,info",
                app_name
            )
            .into()
        }

        #[cfg(not(debug_assertions))]
        {
            "info".into()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("You can increase verbosity by setting the RUST_LOG environment variable.");
}

pub(crate) fn listen_addr() -> String {
    std::env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
}

pub(crate) fn reap_interval() -> Duration {
    let secs = match std::env::var("SESSION_REAP_INTERVAL") {
        Ok(value) => value.parse::<u64>().ok().filter(|s| *s > 0).unwrap_or_else(|| {
            tracing::warn!(
                "Invalid SESSION_REAP_INTERVAL {:?}, using {}s",
                value,
                DEFAULT_REAP_INTERVAL_SECS
            );
            DEFAULT_REAP_INTERVAL_SECS
        }),
        Err(_) => DEFAULT_REAP_INTERVAL_SECS,
    };
    Duration::from_secs(secs)
}

pub(crate) async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
