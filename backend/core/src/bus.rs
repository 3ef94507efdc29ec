use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::message::{ContextId, GateMessage, OrchestratorMessage, PanelMessage, SurfaceMessage};

/// Default channel buffer size for inter-context messaging.
const DEFAULT_BUFFER_SIZE: usize = 256;

/// The message bus connecting the fixed-lifetime contexts: the Host
/// Orchestrator, the control panel, and the Access Gate.
///
/// Page contexts come and go, so they register with the [`SurfaceRegistry`]
/// instead of getting a fixed slot here. Built on bounded Tokio mpsc
/// channels; per-sender ordering is FIFO, cross-sender ordering is not
/// guaranteed.
pub struct SnapBus {
    pub orchestrator_tx: mpsc::Sender<OrchestratorMessage>,
    pub orchestrator_rx: Option<mpsc::Receiver<OrchestratorMessage>>,

    pub panel_tx: mpsc::Sender<PanelMessage>,
    pub panel_rx: Option<mpsc::Receiver<PanelMessage>>,

    pub gate_tx: mpsc::Sender<GateMessage>,
    pub gate_rx: Option<mpsc::Receiver<GateMessage>>,
}

impl SnapBus {
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(buffer: usize) -> Self {
        let (orchestrator_tx, orchestrator_rx) = mpsc::channel(buffer);
        let (panel_tx, panel_rx) = mpsc::channel(buffer);
        let (gate_tx, gate_rx) = mpsc::channel(buffer);

        info!(buffer_size = buffer, "SnapBus initialized");

        Self {
            orchestrator_tx,
            orchestrator_rx: Some(orchestrator_rx),
            panel_tx,
            panel_rx: Some(panel_rx),
            gate_tx,
            gate_rx: Some(gate_rx),
        }
    }

    /// Take the orchestrator receiver (can only be called once).
    pub fn take_orchestrator_rx(&mut self) -> Option<mpsc::Receiver<OrchestratorMessage>> {
        debug!("Orchestrator receiver taken");
        self.orchestrator_rx.take()
    }

    /// Take the panel receiver (can only be called once).
    pub fn take_panel_rx(&mut self) -> Option<mpsc::Receiver<PanelMessage>> {
        debug!("Panel receiver taken");
        self.panel_rx.take()
    }

    /// Take the gate receiver (can only be called once).
    pub fn take_gate_rx(&mut self) -> Option<mpsc::Receiver<GateMessage>> {
        debug!("Gate receiver taken");
        self.gate_rx.take()
    }
}

impl Default for SnapBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of live page-context surfaces, keyed by context id.
///
/// Pages register on load and deregister on teardown; broadcasting to a
/// context that is absent or whose receiver has been dropped is not an
/// error, the send is simply skipped.
#[derive(Default)]
pub struct SurfaceRegistry {
    pages: Mutex<HashMap<ContextId, mpsc::Sender<SurfaceMessage>>>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, context_id: ContextId, tx: mpsc::Sender<SurfaceMessage>) {
        debug!(context = %context_id, "Page surface registered");
        self.pages.lock().unwrap().insert(context_id, tx);
    }

    pub fn deregister(&self, context_id: ContextId) {
        debug!(context = %context_id, "Page surface deregistered");
        self.pages.lock().unwrap().remove(&context_id);
    }

    pub fn is_registered(&self, context_id: ContextId) -> bool {
        self.pages.lock().unwrap().contains_key(&context_id)
    }

    /// Fire-and-forget delivery to one page context. Returns whether the
    /// message was handed to a live channel.
    pub async fn send_to(&self, context_id: ContextId, msg: SurfaceMessage) -> bool {
        let tx = {
            let pages = self.pages.lock().unwrap();
            pages.get(&context_id).cloned()
        };
        match tx {
            Some(tx) => match tx.send(msg).await {
                Ok(()) => true,
                Err(_) => {
                    debug!(context = %context_id, "Page surface receiver dropped; skipping");
                    false
                }
            },
            None => {
                debug!(context = %context_id, "No page surface for context; skipping");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::PromptVariant;
    use crate::region::{CaptureRegion, Point};
    use crate::CaptureRequest;

    #[tokio::test]
    async fn test_bus_send_receive() {
        let mut bus = SnapBus::new();
        let mut rx = bus.take_orchestrator_rx().unwrap();

        let request = CaptureRequest::new(
            ContextId::new(),
            CaptureRegion::from_points(Point::new(0.0, 0.0), Point::new(5.0, 5.0)),
            1.0,
        );
        let request_id = request.request_id;

        bus.orchestrator_tx
            .send(OrchestratorMessage::CaptureArea(request))
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            OrchestratorMessage::CaptureArea(req) => assert_eq!(req.request_id, request_id),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bus_take_rx_once() {
        let mut bus = SnapBus::new();
        assert!(bus.take_panel_rx().is_some());
        assert!(bus.take_panel_rx().is_none()); // second take is None
    }

    #[tokio::test]
    async fn test_registry_skips_unknown_context() {
        let registry = SurfaceRegistry::new();
        let delivered = registry
            .send_to(
                ContextId::new(),
                SurfaceMessage::DisplayResponse {
                    response: "answer".into(),
                    variant: PromptVariant::FreeformCapture,
                },
            )
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_registry_skips_dropped_receiver() {
        let registry = SurfaceRegistry::new();
        let ctx = ContextId::new();
        let (tx, rx) = mpsc::channel(4);
        registry.register(ctx, tx);
        drop(rx);

        let delivered = registry
            .send_to(
                ctx,
                SurfaceMessage::ActivateSelector { stealth_mode: false },
            )
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_registry_delivers_to_live_context() {
        let registry = SurfaceRegistry::new();
        let ctx = ContextId::new();
        let (tx, mut rx) = mpsc::channel(4);
        registry.register(ctx, tx);

        assert!(
            registry
                .send_to(ctx, SurfaceMessage::ActivateSelector { stealth_mode: true })
                .await
        );
        match rx.recv().await.unwrap() {
            SurfaceMessage::ActivateSelector { stealth_mode } => assert!(stealth_mode),
            other => panic!("unexpected message: {:?}", other),
        }

        registry.deregister(ctx);
        assert!(!registry.is_registered(ctx));
    }
}
