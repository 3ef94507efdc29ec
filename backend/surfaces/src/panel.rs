use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use snaplens_core::{Component, PanelMessage};
use snaplens_store::StateStore;

/// Shown before any pipeline run has produced an answer.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response yet.";

/// The control-panel surface: shows the latest answer, seeded from the
/// persisted store on startup so a freshly opened panel is not blank.
/// Read-only with respect to the store; the broadcast step owns that write.
pub struct PanelSurface {
    store: Arc<StateStore>,
    shown: Arc<Mutex<String>>,
}

impl PanelSurface {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self {
            store,
            shown: Arc::new(Mutex::new(NO_RESPONSE_PLACEHOLDER.to_string())),
        }
    }

    /// The text currently displayed by the panel.
    pub fn shown(&self) -> Arc<Mutex<String>> {
        Arc::clone(&self.shown)
    }
}

#[async_trait]
impl Component for PanelSurface {
    type Msg = PanelMessage;

    fn name(&self) -> &str {
        "panel"
    }

    async fn start(&self, mut rx: mpsc::Receiver<PanelMessage>) -> Result<()> {
        // Seed from the durable state written by earlier runs.
        if let Some(response) = self.store.snapshot().response {
            *self.shown.lock().unwrap() = response;
        }
        info!("Panel surface started");

        while let Some(msg) = rx.recv().await {
            match msg {
                PanelMessage::UpdateResponse { response } => {
                    info!(chars = response.len(), "Panel response updated");
                    *self.shown.lock().unwrap() = response;
                }
            }
        }

        info!("Panel surface shut down");
        Ok(())
    }
}
