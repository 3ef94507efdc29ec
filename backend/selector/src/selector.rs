use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use snaplens_core::{CaptureRequest, ContextId, OrchestratorMessage};

use crate::gesture::{PointerEvent, SelectionGesture};
use crate::overlay::OverlayRenderer;

/// One active selection session inside a page context.
pub struct RegionSelector {
    context_id: ContextId,
    stealth: bool,
    device_pixel_ratio: f64,
    gesture: SelectionGesture,
    overlay: Box<dyn OverlayRenderer>,
    orchestrator_tx: mpsc::Sender<OrchestratorMessage>,
}

impl RegionSelector {
    pub fn new(
        context_id: ContextId,
        stealth: bool,
        device_pixel_ratio: f64,
        overlay: Box<dyn OverlayRenderer>,
        orchestrator_tx: mpsc::Sender<OrchestratorMessage>,
    ) -> Self {
        let mut selector = Self {
            context_id,
            stealth,
            device_pixel_ratio,
            gesture: SelectionGesture::new(),
            overlay,
            orchestrator_tx,
        };
        selector.overlay.mount(stealth);
        selector
    }

    /// Feed one pointer event through the gesture machine. Returns `true`
    /// once the selection completed (successfully emitted or not) and this
    /// selector is spent.
    pub async fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down { button, at } => {
                if self.gesture.press(button, at) {
                    debug!(context = %self.context_id, "Selection anchored");
                }
                false
            }
            PointerEvent::Move { at } => {
                if let Some(live) = self.gesture.motion(at) {
                    // Stealth draws nothing; the anchor is all that matters.
                    if !self.stealth {
                        self.overlay.update_rect(live);
                    }
                }
                false
            }
            PointerEvent::Up { at } => {
                let Some(region) = self.gesture.release(at) else {
                    return false;
                };

                // Cleanup happens on the transition itself, before and
                // regardless of emission outcome.
                self.overlay.teardown();

                let request =
                    CaptureRequest::new(self.context_id, region, self.device_pixel_ratio);
                info!(
                    context = %self.context_id,
                    request = %request.request_id,
                    "Selection complete; emitting capture request"
                );
                if let Err(e) = self
                    .orchestrator_tx
                    .send(OrchestratorMessage::CaptureArea(request))
                    .await
                {
                    warn!(context = %self.context_id, error = %e, "Capture request emission failed");
                }
                true
            }
        }
    }

    /// Abandon this selector, tearing down its visuals.
    pub fn dismiss(&mut self) {
        self.gesture.reset();
        self.overlay.teardown();
    }
}

/// Guarantees at most one live selector per page context: a later activation
/// replaces (and tears down) any prior instance instead of stacking.
pub struct SelectorHost {
    context_id: ContextId,
    device_pixel_ratio: f64,
    orchestrator_tx: mpsc::Sender<OrchestratorMessage>,
    overlay_factory: Box<dyn Fn() -> Box<dyn OverlayRenderer> + Send + Sync>,
    active: Option<RegionSelector>,
}

impl SelectorHost {
    pub fn new(
        context_id: ContextId,
        device_pixel_ratio: f64,
        orchestrator_tx: mpsc::Sender<OrchestratorMessage>,
        overlay_factory: impl Fn() -> Box<dyn OverlayRenderer> + Send + Sync + 'static,
    ) -> Self {
        Self {
            context_id,
            device_pixel_ratio,
            orchestrator_tx,
            overlay_factory: Box::new(overlay_factory),
            active: None,
        }
    }

    /// Activate a fresh selector, replacing any existing one.
    pub fn activate(&mut self, stealth: bool) {
        if let Some(mut prior) = self.active.take() {
            info!(context = %self.context_id, "Replacing existing selector instance");
            prior.dismiss();
        }
        self.active = Some(RegionSelector::new(
            self.context_id,
            stealth,
            self.device_pixel_ratio,
            (self.overlay_factory)(),
            self.orchestrator_tx.clone(),
        ));
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Route pointer input to the active selector, dropping it once its
    /// gesture completes.
    pub async fn pointer(&mut self, event: PointerEvent) {
        if let Some(selector) = self.active.as_mut() {
            if selector.handle_pointer(event).await {
                self.active = None;
            }
        }
    }
}
