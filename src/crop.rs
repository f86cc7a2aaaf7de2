//! Centered aspect-ratio crop and JPEG encoding of a captured frame.

use crate::assert_invariant;
use crate::errors::CaptureError;
use crate::invariants::{CROP_MATCHES_RATIO, CROP_WITHIN_FRAME};
use crate::types::{AspectRatio, CapturedImage, RawFrame};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};
use serde::Serialize;

const EPSILON: f64 = 1e-6;

/// Source rectangle in frame coordinates, before any rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropRect {
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// Largest rectangle of `ratio` centered in a `frame_width x frame_height` frame.
    ///
    /// A frame wider than the target keeps its height and is trimmed on the
    /// left and right; otherwise it keeps its width and is trimmed top and bottom.
    ///
    /// Returns [`CaptureError::NoActiveFrame`] for a frame with a zero
    /// dimension and [`CaptureError::InvalidAspectRatio`] for a zero ratio unit.
    pub fn centered(
        frame_width: u32,
        frame_height: u32,
        ratio: &AspectRatio,
    ) -> Result<Self, CaptureError> {
        if frame_width == 0 || frame_height == 0 {
            return Err(CaptureError::NoActiveFrame);
        }
        ratio.validate()?;

        let frame_w = frame_width as f64;
        let frame_h = frame_height as f64;
        let frame_aspect = frame_w / frame_h;
        let target_aspect = ratio.target_aspect();

        let rect = if frame_aspect > target_aspect {
            let width = frame_h * target_aspect;
            Self {
                offset_x: (frame_w - width) / 2.0,
                offset_y: 0.0,
                width,
                height: frame_h,
            }
        } else {
            let height = frame_w / target_aspect;
            Self {
                offset_x: 0.0,
                offset_y: (frame_h - height) / 2.0,
                width: frame_w,
                height,
            }
        };

        assert_invariant!(
            rect.fits_within(frame_width, frame_height),
            CROP_WITHIN_FRAME,
            "crop"
        );
        assert_invariant!(
            ((rect.aspect() - target_aspect) / target_aspect).abs() < 1e-9,
            CROP_MATCHES_RATIO,
            "crop"
        );

        Ok(rect)
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.offset_x >= -EPSILON
            && self.offset_y >= -EPSILON
            && self.offset_x + self.width <= frame_width as f64 + EPSILON
            && self.offset_y + self.height <= frame_height as f64 + EPSILON
    }

    /// Integer source region for this rect.
    ///
    /// The destination surface takes the truncated crop size (as a canvas
    /// does when given fractional dimensions), never less than one pixel.
    /// Sizes within float noise of a whole pixel count as that pixel.
    /// Offsets are rounded to the nearest pixel and clamped so the region
    /// stays inside the frame.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> PixelRect {
        let width = ((self.width + EPSILON).floor() as u32).clamp(1, frame_width.max(1));
        let height = ((self.height + EPSILON).floor() as u32).clamp(1, frame_height.max(1));
        let x = (self.offset_x.round().max(0.0) as u32).min(frame_width.saturating_sub(width));
        let y = (self.offset_y.round().max(0.0) as u32).min(frame_height.saturating_sub(height));
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Crop `frame` to `ratio` and encode the result as JPEG.
pub fn crop_and_encode(
    frame: &RawFrame,
    ratio: &AspectRatio,
    jpeg_quality: u8,
) -> Result<CapturedImage, CaptureError> {
    if !frame.has_pixels() {
        return Err(CaptureError::NoActiveFrame);
    }
    let rect = CropRect::centered(frame.width, frame.height, ratio)?;
    let region = rect.to_pixels(frame.width, frame.height);
    log::debug!(
        "Cropping {}x{} frame to {} -> {:?}",
        frame.width,
        frame.height,
        ratio,
        region
    );

    let pixel_count = frame.width as usize * frame.height as usize * 3;
    let source = RgbImage::from_raw(frame.width, frame.height, frame.data[..pixel_count].to_vec())
        .ok_or_else(|| {
            CaptureError::EncodingFailed("Failed to create image from frame data".to_string())
        })?;
    let cropped = imageops::crop_imm(&source, region.x, region.y, region.width, region.height)
        .to_image();

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, jpeg_quality.clamp(1, 100));
    image::DynamicImage::ImageRgb8(cropped)
        .write_with_encoder(encoder)
        .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;

    Ok(CapturedImage::jpeg(encoded, region.width, region.height))
}
