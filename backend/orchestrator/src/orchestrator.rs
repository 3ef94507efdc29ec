use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use snaplens_core::{
    Component, OrchestratorMessage, PanelMessage, SnapshotSource, SurfaceMessage,
    SurfaceRegistry, TextExtractor,
};
use snaplens_gate::AccessGate;
use snaplens_inference::InferenceClient;
use snaplens_store::StateStore;

use crate::badge::Badge;
use crate::pipeline::PipelineContext;

/// The Host Orchestrator component. Consumes [`OrchestratorMessage`]s and
/// spawns one independent task per pipeline run.
pub struct HostOrchestrator {
    gate: Arc<AccessGate>,
    ctx: Arc<PipelineContext>,
}

impl HostOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gate: Arc<AccessGate>,
        snapshots: Arc<dyn SnapshotSource>,
        extractor: Arc<dyn TextExtractor>,
        inference: InferenceClient,
        store: Arc<StateStore>,
        surfaces: Arc<SurfaceRegistry>,
        panel_tx: mpsc::Sender<PanelMessage>,
    ) -> Self {
        Self {
            gate,
            ctx: Arc::new(PipelineContext {
                snapshots,
                extractor,
                inference,
                store,
                surfaces,
                panel_tx,
                badge: Arc::new(Badge::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn badge(&self) -> Arc<Badge> {
        Arc::clone(&self.ctx.badge)
    }

    /// Number of pipeline runs currently between capture and broadcast.
    pub fn in_flight_count(&self) -> usize {
        self.ctx.in_flight_count()
    }
}

#[async_trait]
impl Component for HostOrchestrator {
    type Msg = OrchestratorMessage;

    fn name(&self) -> &str {
        "orchestrator"
    }

    async fn start(&self, mut rx: mpsc::Receiver<OrchestratorMessage>) -> Result<()> {
        info!("Host orchestrator started");

        while let Some(msg) = rx.recv().await {
            match msg {
                OrchestratorMessage::TriggerSelection {
                    context_id,
                    stealth_mode,
                    reply,
                } => {
                    // Usability gate: no subscription, no overlay, no noise.
                    if !self.gate.is_subscription_active() {
                        debug!(context = %context_id, "Selection trigger ignored: subscription inactive");
                        let _ = reply.send(false);
                        continue;
                    }

                    let stealth = stealth_mode || self.gate.is_stealth_active().await;
                    let delivered = self
                        .ctx
                        .surfaces
                        .send_to(context_id, SurfaceMessage::ActivateSelector {
                            stealth_mode: stealth,
                        })
                        .await;
                    let _ = reply.send(delivered);
                }
                OrchestratorMessage::CaptureArea(request) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        ctx.run_capture(request).await;
                    });
                }
                OrchestratorMessage::OcrCompleted {
                    context_id,
                    extracted_text,
                } => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let run_id = Uuid::new_v4();
                        info!(run = %run_id, context = %context_id, "Extracted text handed over");
                        ctx.answer_and_broadcast(
                            run_id,
                            context_id,
                            &extracted_text,
                            snaplens_core::PromptVariant::FreeformCapture,
                        )
                        .await;
                    });
                }
                OrchestratorMessage::MenuSelection {
                    context_id,
                    text,
                    variant,
                } => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let run_id = Uuid::new_v4();
                        info!(run = %run_id, context = %context_id, variant = %variant, "Menu selection received");
                        ctx.answer_and_broadcast(run_id, context_id, &text, variant).await;
                    });
                }
            }
        }

        info!("Orchestrator channel closed; shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaplens_capture::{StaticCapturer, SyntheticCapturer, UnavailableCapturer};
    use snaplens_core::{
        CaptureRegion, CaptureRequest, ContextId, Point, PromptVariant, SnapBus,
    };
    use snaplens_extraction::MockExtractor;
    use snaplens_gate::StaticEntitlementChecker;
    use snaplens_inference::providers::MockProvider;
    use std::time::Duration;
    use tokio::sync::oneshot;

    struct Harness {
        orchestrator_tx: mpsc::Sender<OrchestratorMessage>,
        panel_rx: mpsc::Receiver<PanelMessage>,
        page_rx: mpsc::Receiver<SurfaceMessage>,
        page_ctx: ContextId,
        provider: Arc<MockProvider>,
        extractor: Arc<MockExtractor>,
        store: Arc<StateStore>,
        badge: Arc<Badge>,
    }

    async fn harness(
        snapshots: Arc<dyn SnapshotSource>,
        extractor: Arc<MockExtractor>,
        provider: Arc<MockProvider>,
        subscription_active: bool,
    ) -> Harness {
        let dir =
            std::env::temp_dir().join(format!("snaplens-orch-test-{}", Uuid::new_v4()));
        let store = Arc::new(StateStore::open(&dir).await.unwrap());
        let gate = Arc::new(AccessGate::new(
            Arc::clone(&store),
            Arc::new(StaticEntitlementChecker::new(true)),
        ));
        if subscription_active {
            gate.activate_subscription("sub-test").await.unwrap();
        }

        let mut bus = SnapBus::new();
        let surfaces = Arc::new(SurfaceRegistry::new());
        let page_ctx = ContextId::new();
        let (page_tx, page_rx) = mpsc::channel(16);
        surfaces.register(page_ctx, page_tx);

        let orchestrator = HostOrchestrator::new(
            gate,
            snapshots,
            extractor.clone(),
            InferenceClient::new(provider.clone() as Arc<dyn snaplens_core::InferenceProvider>),
            Arc::clone(&store),
            surfaces,
            bus.panel_tx.clone(),
        );
        let badge = orchestrator.badge();

        let rx = bus.take_orchestrator_rx().unwrap();
        tokio::spawn(async move { orchestrator.start(rx).await });

        Harness {
            orchestrator_tx: bus.orchestrator_tx.clone(),
            panel_rx: bus.take_panel_rx().unwrap(),
            page_rx,
            page_ctx,
            provider,
            extractor,
            store,
            badge,
        }
    }

    fn capture_request(ctx: ContextId) -> CaptureRequest {
        CaptureRequest::new(
            ctx,
            CaptureRegion::from_points(Point::new(10.0, 10.0), Point::new(110.0, 60.0)),
            2.0,
        )
    }

    async fn recv_timeout<T>(rx: &mut mpsc::Receiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_full_run_broadcasts_once_to_each_surface() {
        let extractor = Arc::new(MockExtractor::new("7x - y = 14"));
        let provider = Arc::new(MockProvider::new().with_response("x = 2, y = 0"));
        let mut h = harness(
            Arc::new(SyntheticCapturer::new(800, 600, 2.0)),
            extractor,
            provider,
            true,
        )
        .await;

        h.orchestrator_tx
            .send(OrchestratorMessage::CaptureArea(capture_request(h.page_ctx)))
            .await
            .unwrap();

        match recv_timeout(&mut h.page_rx).await {
            SurfaceMessage::DisplayResponse { response, variant } => {
                assert_eq!(response, "x = 2, y = 0");
                assert_eq!(variant, PromptVariant::FreeformCapture);
            }
            other => panic!("unexpected page message: {:?}", other),
        }
        match recv_timeout(&mut h.panel_rx).await {
            PanelMessage::UpdateResponse { response } => assert_eq!(response, "x = 2, y = 0"),
        }

        // Exactly one message per surface and one persisted write.
        assert!(h.page_rx.try_recv().is_err());
        assert!(h.panel_rx.try_recv().is_err());
        assert_eq!(h.store.snapshot().response.as_deref(), Some("x = 2, y = 0"));
        assert!(h.badge.is_visible());
        assert_eq!(h.provider.call_count(), 1);
        assert_eq!(h.extractor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_device_scaled_region_reaches_extractor() {
        let extractor = Arc::new(MockExtractor::new("text"));
        let provider = Arc::new(MockProvider::new());
        let mut h = harness(
            Arc::new(SyntheticCapturer::new(800, 600, 2.0)),
            extractor.clone(),
            provider,
            true,
        )
        .await;

        h.orchestrator_tx
            .send(OrchestratorMessage::CaptureArea(capture_request(h.page_ctx)))
            .await
            .unwrap();
        recv_timeout(&mut h.page_rx).await;

        let regions = extractor.seen_regions();
        assert_eq!(regions.len(), 1);
        assert_eq!(
            (regions[0].x, regions[0].y, regions[0].width, regions[0].height),
            (20, 20, 200, 100)
        );
    }

    #[tokio::test]
    async fn test_extraction_failure_makes_no_inference_call_and_no_broadcast() {
        let extractor = Arc::new(MockExtractor::failing());
        let provider = Arc::new(MockProvider::new());
        let mut h = harness(
            Arc::new(SyntheticCapturer::new(800, 600, 1.0)),
            extractor,
            provider.clone(),
            true,
        )
        .await;

        h.orchestrator_tx
            .send(OrchestratorMessage::CaptureArea(capture_request(h.page_ctx)))
            .await
            .unwrap();

        // The panel gets only the neutral placeholder; no broadcast happened.
        match recv_timeout(&mut h.panel_rx).await {
            PanelMessage::UpdateResponse { response } => {
                assert_eq!(response, snaplens_inference::NO_RESPONSE_FALLBACK)
            }
        }
        assert_eq!(provider.call_count(), 0);
        assert!(h.page_rx.try_recv().is_err());
        assert!(h.store.snapshot().response.is_none());
        assert!(!h.badge.is_visible());
    }

    #[tokio::test]
    async fn test_capture_unavailable_is_fully_silent() {
        let extractor = Arc::new(MockExtractor::new("unused"));
        let provider = Arc::new(MockProvider::new());
        let mut h = harness(
            Arc::new(UnavailableCapturer),
            extractor.clone(),
            provider.clone(),
            true,
        )
        .await;

        h.orchestrator_tx
            .send(OrchestratorMessage::CaptureArea(capture_request(h.page_ctx)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(extractor.call_count(), 0);
        assert_eq!(provider.call_count(), 0);
        assert!(h.page_rx.try_recv().is_err());
        assert!(h.panel_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_concurrent_requests_both_broadcast() {
        let extractor = Arc::new(MockExtractor::new("question"));
        let provider = Arc::new(MockProvider::new().with_response("answer"));
        let mut h = harness(
            Arc::new(SyntheticCapturer::new(800, 600, 1.0)),
            extractor,
            provider,
            true,
        )
        .await;

        h.orchestrator_tx
            .send(OrchestratorMessage::CaptureArea(capture_request(h.page_ctx)))
            .await
            .unwrap();
        h.orchestrator_tx
            .send(OrchestratorMessage::CaptureArea(capture_request(h.page_ctx)))
            .await
            .unwrap();

        // Neither request is dropped; completion order is unspecified.
        recv_timeout(&mut h.page_rx).await;
        recv_timeout(&mut h.page_rx).await;
        recv_timeout(&mut h.panel_rx).await;
        recv_timeout(&mut h.panel_rx).await;
    }

    #[tokio::test]
    async fn test_trigger_selection_noops_without_subscription() {
        let extractor = Arc::new(MockExtractor::new("unused"));
        let provider = Arc::new(MockProvider::new());
        let mut h = harness(
            Arc::new(SyntheticCapturer::new(800, 600, 1.0)),
            extractor,
            provider,
            false,
        )
        .await;

        let (reply_tx, reply_rx) = oneshot::channel();
        h.orchestrator_tx
            .send(OrchestratorMessage::TriggerSelection {
                context_id: h.page_ctx,
                stealth_mode: false,
                reply: reply_tx,
            })
            .await
            .unwrap();

        assert!(!reply_rx.await.unwrap());
        assert!(h.page_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_trigger_selection_activates_selector_on_page() {
        let extractor = Arc::new(MockExtractor::new("unused"));
        let provider = Arc::new(MockProvider::new());
        let mut h = harness(
            Arc::new(SyntheticCapturer::new(800, 600, 1.0)),
            extractor,
            provider,
            true,
        )
        .await;

        let (reply_tx, reply_rx) = oneshot::channel();
        h.orchestrator_tx
            .send(OrchestratorMessage::TriggerSelection {
                context_id: h.page_ctx,
                stealth_mode: true,
                reply: reply_tx,
            })
            .await
            .unwrap();

        assert!(reply_rx.await.unwrap());
        match recv_timeout(&mut h.page_rx).await {
            SurfaceMessage::ActivateSelector { stealth_mode } => assert!(stealth_mode),
            other => panic!("unexpected page message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_menu_selection_uses_requested_variant() {
        let extractor = Arc::new(MockExtractor::new("unused"));
        let provider = Arc::new(MockProvider::new().with_response("a nudge"));
        let mut h = harness(
            Arc::new(StaticCapturer::new(vec![], 1.0)),
            extractor,
            provider,
            true,
        )
        .await;

        h.orchestrator_tx
            .send(OrchestratorMessage::MenuSelection {
                context_id: h.page_ctx,
                text: "What is osmosis?".into(),
                variant: PromptVariant::Hint,
            })
            .await
            .unwrap();

        match recv_timeout(&mut h.page_rx).await {
            SurfaceMessage::DisplayResponse { response, variant } => {
                assert_eq!(response, "a nudge");
                assert_eq!(variant, PromptVariant::Hint);
            }
            other => panic!("unexpected page message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ocr_completed_enters_pipeline_at_inference() {
        let extractor = Arc::new(MockExtractor::new("unused"));
        let provider = Arc::new(MockProvider::new().with_response("42"));
        let mut h = harness(
            Arc::new(StaticCapturer::new(vec![], 1.0)),
            extractor.clone(),
            provider.clone(),
            true,
        )
        .await;

        h.orchestrator_tx
            .send(OrchestratorMessage::OcrCompleted {
                context_id: h.page_ctx,
                extracted_text: "6 x 7 = ?".into(),
            })
            .await
            .unwrap();

        match recv_timeout(&mut h.page_rx).await {
            SurfaceMessage::DisplayResponse { response, .. } => assert_eq!(response, "42"),
            other => panic!("unexpected page message: {:?}", other),
        }
        // The page already did extraction; the orchestrator must not re-run it.
        assert_eq!(extractor.call_count(), 0);
        assert_eq!(provider.call_count(), 1);
    }
}
