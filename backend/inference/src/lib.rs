//! Inference client.
//!
//! Builds one of four fixed instruction templates from the extracted (or
//! selected) text, issues exactly one call to the remote inference
//! collaborator, and returns the first choice's content verbatim. Failures
//! are terminal; a missing content field is the one soft-fallback case.

mod client;
mod prompt;
pub mod providers;

pub use client::{InferenceClient, NO_RESPONSE_FALLBACK};
pub use prompt::build_request;
