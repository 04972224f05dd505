use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::storage::SessionStore;

/// Spawns a task that purges expired ceremony sessions every `period`.
///
/// Expired sessions are already invisible to lookups; this only bounds
/// memory held by ceremonies that were started and never finished.
pub fn spawn_session_reaper(store: Arc<dyn SessionStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!("Purged {} expired ceremony sessions", purged),
                Err(e) => tracing::error!("Session purge failed: {}", e),
            }
        }
    })
}
