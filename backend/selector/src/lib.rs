//! Region Selector.
//!
//! Tracks a pointer drag inside one page context and turns it into a
//! normalized [`snaplens_core::CaptureRegion`]. Rendering of the overlay
//! pixels is behind the [`OverlayRenderer`] seam; the gesture machine and
//! teardown rules live here.

mod gesture;
mod overlay;
mod selector;

pub use gesture::{PointerButton, PointerEvent, SelectionGesture};
pub use overlay::{LogOverlay, OverlayRenderer};
pub use selector::{RegionSelector, SelectorHost};
