//! Visual snapshot sources.
//!
//! The orchestrator asks a [`SnapshotSource`] for the visible surface of the
//! context that issued a capture request. The snapshot is an encoded PNG in
//! physical pixels, owned by one pipeline run and dropped after extraction.

mod snapshot;

pub use snapshot::{StaticCapturer, SyntheticCapturer, UnavailableCapturer};
