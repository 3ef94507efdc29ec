//! Access Gate.
//!
//! Holds the two process-wide feature flags: subscription-active and
//! stealth-mode. The subscription check is a usability gate, not a security
//! boundary: interactive features silently no-op when it is off. Stealth
//! mode self-expires two hours after activation, enforced both by a deferred
//! one-shot and eagerly on every read.

mod entitlement;
mod gate;
mod revalidate;

pub use entitlement::{HttpEntitlementChecker, StaticEntitlementChecker};
pub use gate::{stealth_window, AccessGate, GateComponent, STEALTH_WINDOW_SECS};
pub use revalidate::spawn_revalidation;
