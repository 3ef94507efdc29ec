//! Display surfaces.
//!
//! Two passive consumers of broadcasts: the in-page response renderer and
//! the control panel. Both tolerate being absent when a broadcast happens
//! (the orchestrator's sends are fire-and-forget) and neither writes the
//! persisted store.

mod page;
mod panel;

pub use page::PageSurface;
pub use panel::{PanelSurface, NO_RESPONSE_PLACEHOLDER};
