pub mod bus;
pub mod error;
pub mod message;
pub mod region;
pub mod traits;

pub use bus::{SnapBus, SurfaceRegistry};
pub use error::SnapError;
pub use message::{
    CaptureRequest, ContextId, GateMessage, InferenceResult, OrchestratorMessage, PanelMessage,
    PromptVariant, SurfaceMessage,
};
pub use region::{CaptureRegion, DeviceRegion, Point};
pub use traits::{
    Component, EntitlementChecker, InferenceProvider, InferenceRequest, InferenceResponse,
    Snapshot, SnapshotSource, TextExtractor,
};
