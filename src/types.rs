//! Core value types shared by the session, the gallery and the media backends.

use crate::errors::CaptureError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which physical camera a stream originates from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Front,
    #[default]
    Back,
}

impl Facing {
    /// Value of the `facingMode` media constraint for this camera.
    pub fn facing_mode(self) -> &'static str {
        match self {
            Facing::Front => "user",
            Facing::Back => "environment",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Facing::Front => "front",
            Facing::Back => "back",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Facing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" | "user" => Ok(Facing::Front),
            "back" | "environment" => Ok(Facing::Back),
            other => Err(format!("unknown facing: {}", other)),
        }
    }
}

/// Target crop ratio. `label` is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
    pub label: String,
}

impl AspectRatio {
    pub fn new(width: u32, height: u32, label: impl Into<String>) -> Result<Self, CaptureError> {
        let ratio = Self {
            width,
            height,
            label: label.into(),
        };
        ratio.validate()?;
        Ok(ratio)
    }

    pub fn square() -> Self {
        Self::known(1, 1)
    }

    pub fn portrait() -> Self {
        Self::known(3, 4)
    }

    pub fn landscape() -> Self {
        Self::known(4, 3)
    }

    pub fn wide() -> Self {
        Self::known(16, 9)
    }

    fn known(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            label: format!("{}:{}", width, height),
        }
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::InvalidAspectRatio {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// width / height
    pub fn target_aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Value for a CSS `aspect-ratio` declaration on the preview element.
    pub fn css_value(&self) -> String {
        format!("{}/{}", self.width, self.height)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// The built-in ratio set: square first, so it is the default selection.
pub fn default_aspect_ratios() -> Vec<AspectRatio> {
    vec![
        AspectRatio::square(),
        AspectRatio::portrait(),
        AspectRatio::landscape(),
        AspectRatio::wide(),
    ]
}

/// Zoom range a video track reports as supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends. NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Result of a per-track capability query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackCapabilities {
    pub zoom: Option<ZoomRange>,
}

/// Constraints passed to the media backend when requesting a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub video: VideoConstraints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    pub facing_mode: String,
    pub zoom: bool,
}

impl MediaConstraints {
    pub fn for_facing(facing: Facing, request_zoom: bool) -> Self {
        Self {
            video: VideoConstraints {
                facing_mode: facing.facing_mode().to_string(),
                zoom: request_zoom,
            },
        }
    }

    /// Facing this request asks for, if the mode is one we know.
    pub fn facing(&self) -> Option<Facing> {
        self.video.facing_mode.parse().ok()
    }
}

/// A raw RGB24 frame read from the preview surface.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub stream_id: String,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, stream_id: impl Into<String>) -> Self {
        Self {
            width,
            height,
            data,
            stream_id: stream_id.into(),
        }
    }

    pub fn has_pixels(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() >= self.expected_len()
    }

    fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// An encoded still image. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    data: Bytes,
    width: u32,
    height: u32,
    mime_type: &'static str,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub const JPEG: &'static str = "image/jpeg";

    pub fn jpeg(data: impl Into<Bytes>, width: u32, height: u32) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            mime_type: Self::JPEG,
            captured_at: Utc::now(),
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// `data:` URI suitable for an `<img src>` attribute.
    pub fn to_data_uri(&self) -> String {
        use base64::Engine as _;
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }

    pub fn summary(&self) -> CapturedImageInfo {
        CapturedImageInfo {
            width: self.width,
            height: self.height,
            mime_type: self.mime_type.to_string(),
            size_bytes: self.data.len(),
            captured_at: self.captured_at,
        }
    }
}

/// Serializable metadata of a captured image, without the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedImageInfo {
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    pub size_bytes: usize,
    pub captured_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_modes() {
        assert_eq!(Facing::Front.facing_mode(), "user");
        assert_eq!(Facing::Back.facing_mode(), "environment");
        assert_eq!(Facing::Front.toggled(), Facing::Back);
        assert_eq!(Facing::default(), Facing::Back);
    }

    #[test]
    fn test_facing_parse() {
        assert_eq!("environment".parse::<Facing>(), Ok(Facing::Back));
        assert_eq!("Front".parse::<Facing>(), Ok(Facing::Front));
        assert!("side".parse::<Facing>().is_err());
    }

    #[test]
    fn test_default_ratios_order() {
        let labels: Vec<String> = default_aspect_ratios()
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(labels, vec!["1:1", "3:4", "4:3", "16:9"]);
    }

    #[test]
    fn test_aspect_ratio_rejects_zero_units() {
        assert!(AspectRatio::new(0, 9, "0:9").is_err());
        assert!(AspectRatio::new(16, 0, "16:0").is_err());
        assert!(AspectRatio::new(2, 1, "panorama").is_ok());
    }

    #[test]
    fn test_css_value() {
        assert_eq!(AspectRatio::wide().css_value(), "16/9");
    }

    #[test]
    fn test_zoom_range_contains() {
        let range = ZoomRange::new(1.0, 3.0);
        assert!(range.contains(1.0));
        assert!(range.contains(3.0));
        assert!(!range.contains(3.01));
        assert!(!range.contains(f64::NAN));
    }

    #[test]
    fn test_constraints_serialize_like_get_user_media() {
        let constraints = MediaConstraints::for_facing(Facing::Front, true);
        let json = serde_json::to_string(&constraints).unwrap();
        assert_eq!(json, r#"{"video":{"facingMode":"user","zoom":true}}"#);
        assert_eq!(constraints.facing(), Some(Facing::Front));
    }

    #[test]
    fn test_data_uri_prefix() {
        let image = CapturedImage::jpeg(vec![0xff, 0xd8, 0xff], 1, 1);
        assert!(image.to_data_uri().starts_with("data:image/jpeg;base64,"));
        assert_eq!(image.to_data_uri(), "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn test_raw_frame_has_pixels() {
        assert!(RawFrame::new(vec![0; 12], 2, 2, "s").has_pixels());
        assert!(!RawFrame::new(vec![0; 11], 2, 2, "s").has_pixels());
        assert!(!RawFrame::new(Vec::new(), 0, 0, "s").has_pixels());
    }
}
