//! Host Orchestrator.
//!
//! The only component with a persistent lifecycle. Owns the pipeline's
//! cross-call state, sequences snapshot → extraction → inference, and fans
//! each answer out to every live display surface plus the durable store.
//! Concurrent capture requests run as independent tasks keyed by request id;
//! nothing serializes them and the last writer wins.

mod badge;
mod orchestrator;
mod pipeline;

pub use badge::{Badge, BADGE_CLEAR_SECS};
pub use orchestrator::HostOrchestrator;
pub use pipeline::RunStage;
