use std::io::Cursor;

use image::ImageFormat;
use tracing::debug;

use snaplens_core::{DeviceRegion, SnapError};

/// Crop an encoded PNG to `region` (physical pixels) and re-encode.
///
/// The region is clamped to the bitmap bounds; a region that falls entirely
/// outside the bitmap, or is empty after clamping, is an extraction error
/// rather than a zero-byte crop.
pub fn crop_to_region(png: &[u8], region: DeviceRegion) -> Result<Vec<u8>, SnapError> {
    let decoded = image::load_from_memory(png)
        .map_err(|e| SnapError::ExtractionFailed(format!("snapshot decode failed: {e}")))?;

    let (img_w, img_h) = (decoded.width(), decoded.height());
    if region.x >= img_w || region.y >= img_h {
        return Err(SnapError::ExtractionFailed(format!(
            "crop origin ({}, {}) outside {}x{} snapshot",
            region.x, region.y, img_w, img_h
        )));
    }

    let width = region.width.min(img_w - region.x);
    let height = region.height.min(img_h - region.y);
    if width == 0 || height == 0 {
        return Err(SnapError::ExtractionFailed("empty crop region".into()));
    }

    let cropped = decoded.crop_imm(region.x, region.y, width, height);

    let mut out = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| SnapError::ExtractionFailed(format!("crop encode failed: {e}")))?;

    debug!(
        x = region.x,
        y = region.y,
        width,
        height,
        bytes = out.len(),
        "Snapshot cropped"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut data = Vec::new();
        img.write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
            .unwrap();
        data
    }

    #[test]
    fn test_crop_produces_region_sized_image() {
        let source = png(800, 600);
        let out = crop_to_region(
            &source,
            DeviceRegion {
                x: 20,
                y: 20,
                width: 200,
                height: 100,
            },
        )
        .unwrap();

        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 200);
        assert_eq!(decoded.height(), 100);
    }

    #[test]
    fn test_crop_clamps_to_bitmap_edge() {
        let source = png(100, 100);
        let out = crop_to_region(
            &source,
            DeviceRegion {
                x: 80,
                y: 90,
                width: 50,
                height: 50,
            },
        )
        .unwrap();

        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 20);
        assert_eq!(decoded.height(), 10);
    }

    #[test]
    fn test_crop_outside_bitmap_fails() {
        let source = png(100, 100);
        let err = crop_to_region(
            &source,
            DeviceRegion {
                x: 100,
                y: 0,
                width: 10,
                height: 10,
            },
        )
        .unwrap_err();
        assert!(matches!(err, SnapError::ExtractionFailed(_)));
    }

    #[test]
    fn test_undecodable_snapshot_fails() {
        let err = crop_to_region(
            b"not a png",
            DeviceRegion {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
        )
        .unwrap_err();
        assert!(matches!(err, SnapError::ExtractionFailed(_)));
    }
}
