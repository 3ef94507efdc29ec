use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::SnapError;
use crate::message::{ContextId, PromptVariant};
use crate::region::DeviceRegion;

/// Trait for long-lived SnapLens contexts (orchestrator, gate, surfaces).
///
/// Each component consumes messages from its own channel and runs in its own
/// Tokio task; components never share memory.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// The message type this component's event loop consumes.
    type Msg: Send + 'static;

    /// Human-readable name of this component.
    fn name(&self) -> &str;

    /// Start the component's event loop, consuming from the given receiver.
    async fn start(&self, rx: mpsc::Receiver<Self::Msg>) -> Result<()>;
}

/// An opaque captured bitmap, scoped to one pipeline run.
///
/// `data` is an encoded PNG in physical pixels. Never persisted; dropped as
/// soon as extraction is done with it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub data: Vec<u8>,
    pub device_pixel_ratio: f64,
}

/// Produces a visual snapshot of a context's visible surface.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Capture the visible surface of the given context. Fails with
    /// [`SnapError::CaptureUnavailable`] when no snapshot can be produced
    /// (context gone, permission denied).
    async fn capture(&self, context_id: ContextId) -> Result<Snapshot, SnapError>;
}

/// Black-box text extraction over a cropped bitmap region.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text from `snapshot` cropped to `region` (physical pixels).
    /// Fails with [`SnapError::ExtractionFailed`] on any engine error.
    async fn extract_text(
        &self,
        snapshot: &Snapshot,
        region: DeviceRegion,
    ) -> Result<String, SnapError>;
}

/// Request to the remote inference collaborator.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub variant: PromptVariant,
}

/// Response from the remote inference collaborator.
#[derive(Debug, Clone)]
pub struct InferenceResponse {
    /// First choice's content, or `None` when the field was absent.
    pub content: Option<String>,
    pub provider: String,
    pub latency_ms: u64,
}

/// Trait for remote inference providers.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Provider name (e.g., "openai", "mock").
    fn name(&self) -> &str;

    /// Issue one completion call. No retries at this level.
    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse, SnapError>;
}

/// External entitlement collaborator consulted on activation and on the
/// periodic revalidation pass.
#[async_trait]
pub trait EntitlementChecker: Send + Sync {
    /// Whether the given subscription id is active and paid.
    async fn verify(&self, subscription_id: &str) -> Result<bool, SnapError>;
}
