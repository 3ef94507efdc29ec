use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tracing::{info, warn};

use crate::gate::AccessGate;

/// Run the periodic entitlement revalidation loop: once at startup, then on
/// a fixed long interval. Returns the task handle so the host can abort it
/// on shutdown.
pub fn spawn_revalidation(gate: Arc<AccessGate>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Revalidation loop started");

        let mut ticker = time::interval(interval);
        loop {
            // First tick fires immediately, covering the startup check.
            ticker.tick().await;
            if let Err(e) = gate.revalidate().await {
                warn!(error = %e, "Subscription revalidation failed");
            }
        }
    })
}
