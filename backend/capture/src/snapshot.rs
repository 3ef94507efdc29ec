use std::io::Cursor;

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use tracing::{debug, info};

use snaplens_core::{ContextId, SnapError, Snapshot, SnapshotSource};

/// Synthesizes a viewport-sized PNG instead of talking to a real
/// compositor. Stands in for the host's visible-tab capture in daemon runs
/// and demos; the bitmap is physically sized `logical × device_pixel_ratio`.
pub struct SyntheticCapturer {
    logical_width: u32,
    logical_height: u32,
    device_pixel_ratio: f64,
}

impl SyntheticCapturer {
    pub fn new(logical_width: u32, logical_height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            logical_width,
            logical_height,
            device_pixel_ratio,
        }
    }
}

#[async_trait]
impl SnapshotSource for SyntheticCapturer {
    async fn capture(&self, context_id: ContextId) -> Result<Snapshot, SnapError> {
        let width = (self.logical_width as f64 * self.device_pixel_ratio).round() as u32;
        let height = (self.logical_height as f64 * self.device_pixel_ratio).round() as u32;

        info!(
            context = %context_id,
            width,
            height,
            dpr = self.device_pixel_ratio,
            "Capturing synthetic viewport snapshot"
        );

        let canvas = RgbaImage::from_pixel(width, height, Rgba([245, 245, 245, 255]));
        let mut data = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
            .map_err(|e| SnapError::CaptureUnavailable(format!("PNG encode failed: {e}")))?;

        debug!(bytes = data.len(), "Snapshot encoded");
        Ok(Snapshot {
            data,
            device_pixel_ratio: self.device_pixel_ratio,
        })
    }
}

/// Serves a fixed, pre-encoded bitmap. Test double for pipeline runs that
/// need real pixels to crop.
pub struct StaticCapturer {
    data: Vec<u8>,
    device_pixel_ratio: f64,
}

impl StaticCapturer {
    pub fn new(data: Vec<u8>, device_pixel_ratio: f64) -> Self {
        Self {
            data,
            device_pixel_ratio,
        }
    }
}

#[async_trait]
impl SnapshotSource for StaticCapturer {
    async fn capture(&self, _context_id: ContextId) -> Result<Snapshot, SnapError> {
        Ok(Snapshot {
            data: self.data.clone(),
            device_pixel_ratio: self.device_pixel_ratio,
        })
    }
}

/// Always fails, modelling a context that disappeared before the snapshot
/// could be taken.
pub struct UnavailableCapturer;

#[async_trait]
impl SnapshotSource for UnavailableCapturer {
    async fn capture(&self, context_id: ContextId) -> Result<Snapshot, SnapError> {
        Err(SnapError::CaptureUnavailable(format!(
            "context {context_id} has no visible surface"
        )))
    }
}
