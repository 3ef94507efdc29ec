use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::region::CaptureRegion;

/// Identity of an isolated execution context (a page, the panel, the
/// orchestrator). Contexts share no memory; all coordination is message
/// passing keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub Uuid);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A completed drag gesture, ready for the orchestrator. Consumed exactly
/// once; `request_id` keys the pipeline run it starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub request_id: Uuid,
    pub context_id: ContextId,
    pub region: CaptureRegion,
    pub device_pixel_ratio: f64,
}

impl CaptureRequest {
    pub fn new(context_id: ContextId, region: CaptureRegion, device_pixel_ratio: f64) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            context_id,
            region,
            device_pixel_ratio,
        }
    }
}

/// Which instruction template and length constraint a query uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptVariant {
    /// Short literal answer, a few words at most.
    ShortAnswer,
    /// One-sentence nudge toward the answer.
    Hint,
    /// Fixed-count bullet list of memory jogs.
    Pointers,
    /// Free-form concise solution for drag-captured content.
    FreeformCapture,
}

impl PromptVariant {
    /// Map a context-menu label to its variant. Drag-selection captures do
    /// not go through labels; they always use `FreeformCapture`.
    pub fn from_menu_label(label: &str) -> Option<Self> {
        match label {
            "quick answer" => Some(Self::ShortAnswer),
            "hint" => Some(Self::Hint),
            "pointers" => Some(Self::Pointers),
            _ => None,
        }
    }
}

impl std::fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", s)
    }
}

/// The terminal artifact of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResult {
    pub text: String,
    pub source_variant: PromptVariant,
}

/// Messages consumed by the Host Orchestrator.
///
/// Variants carrying a `reply` expect exactly one response on the oneshot;
/// the rest are fire-and-forget (the result, if any, arrives via broadcast).
#[derive(Debug)]
pub enum OrchestratorMessage {
    /// Surface or keyboard trigger asks for a new selection overlay.
    TriggerSelection {
        context_id: ContextId,
        stealth_mode: bool,
        reply: oneshot::Sender<bool>,
    },
    /// Region Selector finished a gesture; start a pipeline run.
    CaptureArea(CaptureRequest),
    /// A page context ran extraction itself and is handing over the text.
    OcrCompleted {
        context_id: ContextId,
        extracted_text: String,
    },
    /// Context-menu invocation on already-selected text.
    MenuSelection {
        context_id: ContextId,
        text: String,
        variant: PromptVariant,
    },
}

/// Messages consumed by a page-context surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceMessage {
    /// Mount (or replace) the region selector in this page.
    ActivateSelector { stealth_mode: bool },
    /// Render the latest answer inline.
    DisplayResponse {
        response: String,
        variant: PromptVariant,
    },
}

/// Messages consumed by the control-panel surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelMessage {
    UpdateResponse { response: String },
}

/// Messages consumed by the Access Gate.
#[derive(Debug)]
pub enum GateMessage {
    CheckSubscription {
        reply: oneshot::Sender<bool>,
    },
    Activate {
        subscription_id: String,
        reply: oneshot::Sender<bool>,
    },
    Deactivate,
    SetStealth {
        enabled: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Point;

    #[test]
    fn test_menu_label_mapping() {
        assert_eq!(
            PromptVariant::from_menu_label("quick answer"),
            Some(PromptVariant::ShortAnswer)
        );
        assert_eq!(PromptVariant::from_menu_label("hint"), Some(PromptVariant::Hint));
        assert_eq!(
            PromptVariant::from_menu_label("pointers"),
            Some(PromptVariant::Pointers)
        );
        assert_eq!(PromptVariant::from_menu_label("translate"), None);
    }

    #[test]
    fn test_capture_request_gets_fresh_identity() {
        let region =
            CaptureRegion::from_points(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let ctx = ContextId::new();
        let a = CaptureRequest::new(ctx, region, 1.0);
        let b = CaptureRequest::new(ctx, region, 1.0);
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.context_id, b.context_id);
    }

    #[test]
    fn test_surface_message_serialization_roundtrip() {
        let msg = SurfaceMessage::DisplayResponse {
            response: "x = 2, y = 0".into(),
            variant: PromptVariant::FreeformCapture,
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: SurfaceMessage = serde_json::from_str(&json).unwrap();
        match back {
            SurfaceMessage::DisplayResponse { response, variant } => {
                assert_eq!(response, "x = 2, y = 0");
                assert_eq!(variant, PromptVariant::FreeformCapture);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_variant_display() {
        assert_eq!(PromptVariant::ShortAnswer.to_string(), "short_answer");
        assert_eq!(PromptVariant::FreeformCapture.to_string(), "freeform_capture");
    }
}
