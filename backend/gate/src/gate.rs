use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use snaplens_core::{Component, EntitlementChecker, GateMessage, SnapError};
use snaplens_store::StateStore;

/// How long stealth mode stays on before it clears itself.
pub const STEALTH_WINDOW_SECS: i64 = 2 * 60 * 60;

/// The stealth auto-disable window as a chrono duration.
pub fn stealth_window() -> ChronoDuration {
    ChronoDuration::seconds(STEALTH_WINDOW_SECS)
}

/// The Access Gate: the only writer of the subscription and stealth keys.
pub struct AccessGate {
    store: Arc<StateStore>,
    checker: Arc<dyn EntitlementChecker>,
    /// Pending one-shot that clears stealth at expiry. Replaced on every
    /// enable, aborted on disable.
    expiry_task: Mutex<Option<JoinHandle<()>>>,
}

impl AccessGate {
    pub fn new(store: Arc<StateStore>, checker: Arc<dyn EntitlementChecker>) -> Self {
        Self {
            store,
            checker,
            expiry_task: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn is_subscription_active(&self) -> bool {
        self.store.snapshot().subscription_active
    }

    /// Whether stealth is on right now. If the stored expiry has passed, the
    /// flag is treated as cleared even when the deferred one-shot has not
    /// fired (it may have been lost to a process suspend), and the persisted
    /// state is cleaned up on the spot.
    pub async fn is_stealth_active(&self) -> bool {
        let now = Utc::now();
        if self.stealth_active_at(now) {
            return true;
        }
        // Lazily clear a stale persisted flag.
        let state = self.store.snapshot();
        if state.stealth_mode {
            info!("Stealth expiry passed; clearing stale flag on read");
            if let Err(e) = self.clear_stealth_state().await {
                warn!(error = %e, "Failed to clear stale stealth state");
            }
        }
        false
    }

    /// Pure expiry check against an explicit clock.
    pub fn stealth_active_at(&self, now: DateTime<Utc>) -> bool {
        let state = self.store.snapshot();
        if !state.stealth_mode {
            return false;
        }
        match state.stealth_mode_expiry {
            Some(expiry) => now < expiry,
            // Enabled with no recorded deadline: treat as expired rather
            // than stuck-on.
            None => false,
        }
    }

    /// Validate `subscription_id` against the entitlement collaborator and
    /// persist on success. An invalid or unpaid id is `ActivationRejected`,
    /// the one failure kind surfaced directly to the user.
    pub async fn activate_subscription(&self, subscription_id: &str) -> Result<(), SnapError> {
        let valid = self.checker.verify(subscription_id).await?;
        if !valid {
            warn!("Activation rejected by entitlement check");
            return Err(SnapError::ActivationRejected(
                "subscription id is invalid or unpaid".into(),
            ));
        }

        self.store
            .update(|s| {
                s.subscription_active = true;
                s.subscription_id = Some(subscription_id.to_string());
            })
            .await
            .map_err(|e| SnapError::StorageError(e.to_string()))?;

        info!("Subscription activated");
        Ok(())
    }

    pub async fn deactivate_subscription(&self) -> Result<(), SnapError> {
        self.store
            .update(|s| {
                s.subscription_active = false;
                s.subscription_id = None;
            })
            .await
            .map_err(|e| SnapError::StorageError(e.to_string()))?;

        info!("Subscription deactivated");
        Ok(())
    }

    /// Toggle stealth mode. Enabling persists a deadline two hours out and
    /// schedules a one-shot clear; enabling again restarts the window.
    /// Disabling aborts any pending one-shot and clears immediately.
    pub async fn set_stealth(self: &Arc<Self>, enabled: bool) -> Result<(), SnapError> {
        if let Some(task) = self.expiry_task.lock().unwrap().take() {
            task.abort();
        }

        if !enabled {
            self.clear_stealth_state().await?;
            info!("Stealth mode disabled");
            return Ok(());
        }

        let expiry = Utc::now() + stealth_window();
        self.store
            .update(|s| {
                s.stealth_mode = true;
                s.stealth_mode_expiry = Some(expiry);
            })
            .await
            .map_err(|e| SnapError::StorageError(e.to_string()))?;

        let gate = Arc::clone(self);
        let sleep_for = std::time::Duration::from_secs(STEALTH_WINDOW_SECS as u64);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(sleep_for).await;
            info!("Stealth window elapsed; auto-disabling");
            if let Err(e) = gate.clear_stealth_state().await {
                warn!(error = %e, "Deferred stealth clear failed");
            }
        });
        *self.expiry_task.lock().unwrap() = Some(handle);

        info!(expiry = %expiry, "Stealth mode enabled");
        Ok(())
    }

    async fn clear_stealth_state(&self) -> Result<(), SnapError> {
        self.store
            .update(|s| {
                s.stealth_mode = false;
                s.stealth_mode_expiry = None;
            })
            .await
            .map_err(|e| SnapError::StorageError(e.to_string()))?;
        Ok(())
    }

    /// Re-verify the stored subscription id against the entitlement
    /// collaborator and persist the outcome. A missing id means inactive.
    pub async fn revalidate(&self) -> Result<(), SnapError> {
        let id = self.store.snapshot().subscription_id;
        let active = match id {
            Some(id) => match self.checker.verify(&id).await {
                Ok(active) => active,
                Err(e) => {
                    // Collaborator unreachable: keep the current flag rather
                    // than locking a paying user out on a network blip.
                    warn!(error = %e, "Entitlement revalidation unreachable; keeping current state");
                    return Ok(());
                }
            },
            None => false,
        };

        self.store
            .update(|s| s.subscription_active = active)
            .await
            .map_err(|e| SnapError::StorageError(e.to_string()))?;

        info!(active, "Subscription revalidated");
        Ok(())
    }
}

/// The gate's message loop: answers subscription checks and applies the
/// explicit user actions coming from the surfaces.
pub struct GateComponent {
    gate: Arc<AccessGate>,
}

impl GateComponent {
    pub fn new(gate: Arc<AccessGate>) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl Component for GateComponent {
    type Msg = GateMessage;

    fn name(&self) -> &str {
        "gate"
    }

    async fn start(&self, mut rx: mpsc::Receiver<GateMessage>) -> Result<()> {
        info!("Access gate started");

        while let Some(msg) = rx.recv().await {
            match msg {
                GateMessage::CheckSubscription { reply } => {
                    let _ = reply.send(self.gate.is_subscription_active());
                }
                GateMessage::Activate {
                    subscription_id,
                    reply,
                } => {
                    let result = self.gate.activate_subscription(&subscription_id).await;
                    if let Err(e) = &result {
                        warn!(error = %e, "Subscription activation failed");
                    }
                    let _ = reply.send(result.is_ok());
                }
                GateMessage::Deactivate => {
                    if let Err(e) = self.gate.deactivate_subscription().await {
                        warn!(error = %e, "Subscription deactivation failed");
                    }
                }
                GateMessage::SetStealth { enabled } => {
                    if let Err(e) = self.gate.set_stealth(enabled).await {
                        warn!(error = %e, "Stealth toggle failed");
                    }
                }
            }
        }

        info!("Access gate channel closed; shutting down");
        Ok(())
    }
}
