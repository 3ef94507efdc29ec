//! Text extraction.
//!
//! Crops the captured bitmap to the device-scaled selection and hands the
//! crop to a black-box recognition engine behind the
//! [`snaplens_core::TextExtractor`] seam.

mod crop;
mod extractor;

pub use crop::crop_to_region;
pub use extractor::{MockExtractor, VisionExtractor};
