use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use snaplens_core::{
    CaptureRequest, ContextId, InferenceResult, PanelMessage, PromptVariant, SnapError,
    SnapshotSource, SurfaceMessage, SurfaceRegistry, TextExtractor,
};
use snaplens_inference::{InferenceClient, NO_RESPONSE_FALLBACK};
use snaplens_store::StateStore;

use crate::badge::Badge;

/// Where an in-flight run currently is. `Idle` is implicit (not in the
/// table); failed runs leave the table on the way to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Captured,
    Extracted,
    Answered,
}

/// Everything a pipeline run needs, shared across concurrently spawned runs.
pub(crate) struct PipelineContext {
    pub snapshots: Arc<dyn SnapshotSource>,
    pub extractor: Arc<dyn TextExtractor>,
    pub inference: InferenceClient,
    pub store: Arc<StateStore>,
    pub surfaces: Arc<SurfaceRegistry>,
    pub panel_tx: mpsc::Sender<PanelMessage>,
    pub badge: Arc<Badge>,
    pub in_flight: Mutex<HashMap<Uuid, RunStage>>,
}

impl PipelineContext {
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }

    fn enter_stage(&self, run_id: Uuid, stage: RunStage) {
        debug!(run = %run_id, stage = ?stage, "Pipeline stage entered");
        self.in_flight.lock().unwrap().insert(run_id, stage);
    }

    fn finish_run(&self, run_id: Uuid) {
        self.in_flight.lock().unwrap().remove(&run_id);
    }

    /// Full selection-capture run: snapshot, extract, infer, broadcast.
    pub async fn run_capture(&self, request: CaptureRequest) {
        let run_id = request.request_id;
        info!(
            run = %run_id,
            context = %request.context_id,
            "Pipeline run started"
        );

        let snapshot = match self.snapshots.capture(request.context_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // The originating context is gone; nothing to show anyone.
                warn!(run = %run_id, error = %e, "Snapshot unavailable; run abandoned");
                self.finish_run(run_id);
                return;
            }
        };
        self.enter_stage(run_id, RunStage::Captured);

        let device_region = request.region.to_device(request.device_pixel_ratio);
        let extracted = match self.extractor.extract_text(&snapshot, device_region).await {
            Ok(text) => text,
            Err(e) => {
                self.fail_run(run_id, &e).await;
                return;
            }
        };
        // The snapshot is scoped to this run; drop it before the slow call.
        drop(snapshot);
        self.enter_stage(run_id, RunStage::Extracted);

        self.answer_and_broadcast(
            run_id,
            request.context_id,
            &extracted,
            PromptVariant::FreeformCapture,
        )
        .await;
    }

    /// Back half of the pipeline, also the entry point for text that arrived
    /// already extracted (page-side OCR, context-menu selection).
    pub async fn answer_and_broadcast(
        &self,
        run_id: Uuid,
        context_id: ContextId,
        text: &str,
        variant: PromptVariant,
    ) {
        let result = match self.inference.query(text, variant).await {
            Ok(result) => result,
            Err(e) => {
                self.fail_run(run_id, &e).await;
                return;
            }
        };
        self.enter_stage(run_id, RunStage::Answered);

        self.broadcast(context_id, &result).await;
        self.finish_run(run_id);
        info!(run = %run_id, "Pipeline run complete");
    }

    /// Fan the answer out: durable write first, then fire-and-forget
    /// notifications to whichever surfaces are alive, then the badge.
    async fn broadcast(&self, context_id: ContextId, result: &InferenceResult) {
        if let Err(e) = self
            .store
            .update(|s| s.response = Some(result.text.clone()))
            .await
        {
            warn!(error = %e, "Failed to persist broadcast result");
        }

        self.surfaces
            .send_to(
                context_id,
                SurfaceMessage::DisplayResponse {
                    response: result.text.clone(),
                    variant: result.source_variant,
                },
            )
            .await;

        if self
            .panel_tx
            .send(PanelMessage::UpdateResponse {
                response: result.text.clone(),
            })
            .await
            .is_err()
        {
            debug!("Panel not listening; broadcast skipped it");
        }

        self.badge.mark();
    }

    /// Terminal failure for one run: the run leaves the table and the user
    /// sees at most a neutral placeholder on the panel, never a raw error
    /// and never a page or store write.
    async fn fail_run(&self, run_id: Uuid, error: &SnapError) {
        warn!(run = %run_id, error = %error, "Pipeline run failed");
        self.finish_run(run_id);

        let _ = self
            .panel_tx
            .send(PanelMessage::UpdateResponse {
                response: NO_RESPONSE_FALLBACK.to_string(),
            })
            .await;
    }
}
