use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use snaplens_core::{Component, ContextId, PromptVariant, SurfaceMessage};
use snaplens_selector::{PointerEvent, SelectorHost};

/// A page-embedded surface: hosts the region selector and renders answers
/// inline. One instance per page context.
pub struct PageSurface {
    context_id: ContextId,
    host: tokio::sync::Mutex<SelectorHost>,
    pointer_rx: tokio::sync::Mutex<Option<mpsc::Receiver<PointerEvent>>>,
    last_response: Arc<Mutex<Option<(String, PromptVariant)>>>,
}

impl PageSurface {
    /// `pointer_rx` is the page's raw pointer input stream; it is drained
    /// alongside the surface's message channel once the component starts.
    pub fn new(
        context_id: ContextId,
        host: SelectorHost,
        pointer_rx: mpsc::Receiver<PointerEvent>,
    ) -> Self {
        Self {
            context_id,
            host: tokio::sync::Mutex::new(host),
            pointer_rx: tokio::sync::Mutex::new(Some(pointer_rx)),
            last_response: Arc::new(Mutex::new(None)),
        }
    }

    /// The most recently rendered answer, if any.
    pub fn last_response(&self) -> Arc<Mutex<Option<(String, PromptVariant)>>> {
        Arc::clone(&self.last_response)
    }

    async fn handle(&self, msg: SurfaceMessage) {
        match msg {
            SurfaceMessage::ActivateSelector { stealth_mode } => {
                info!(context = %self.context_id, stealth = stealth_mode, "Activating selector");
                self.host.lock().await.activate(stealth_mode);
            }
            SurfaceMessage::DisplayResponse { response, variant } => {
                info!(
                    context = %self.context_id,
                    variant = %variant,
                    "Rendering response in page"
                );
                *self.last_response.lock().unwrap() = Some((response, variant));
            }
        }
    }
}

#[async_trait]
impl Component for PageSurface {
    type Msg = SurfaceMessage;

    fn name(&self) -> &str {
        "page-surface"
    }

    async fn start(&self, mut rx: mpsc::Receiver<SurfaceMessage>) -> Result<()> {
        info!(context = %self.context_id, "Page surface started");

        let mut pointer_rx = self
            .pointer_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow::anyhow!("page surface already started"))?;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(msg) => self.handle(msg).await,
                        None => break,
                    }
                }
                event = pointer_rx.recv() => {
                    match event {
                        Some(event) => {
                            debug!(context = %self.context_id, "Pointer event");
                            self.host.lock().await.pointer(event).await;
                        }
                        None => break,
                    }
                }
            }
        }

        info!(context = %self.context_id, "Page surface shut down");
        Ok(())
    }
}
