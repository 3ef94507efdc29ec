//! Durable shared state.
//!
//! The persisted `response` / `subscriptionActive` / `subscriptionId` /
//! `stealthMode` / `stealthModeExpiry` keys are the only state shared across
//! contexts. Any context may read; only the Access Gate and the
//! orchestrator's broadcast step write. Writers take no lock across
//! processes; writes are infrequent and idempotent in effect, so
//! last-write-wins is acceptable.

mod state;

pub use state::{state_dir, PersistedState, StateStore};
