use crate::types::Facing;
use serde::Serialize;

/// Errors surfaced by the capture session, the encoder and the config layer.
///
/// None of these are fatal: the session stays usable after any of them.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CaptureError {
    #[error("Failed to acquire {facing} camera: {reason}")]
    DeviceAcquisitionFailed { facing: Facing, reason: String },

    #[error("Zoom is not supported on this device")]
    ZoomUnsupported,

    #[error("Zoom level {requested} is out of the supported range ({min} - {max})")]
    ZoomOutOfRange { requested: f64, min: f64, max: f64 },

    #[error("No active camera frame to capture")]
    NoActiveFrame,

    #[error("Camera control error: {0}")]
    ControlFailed(String),

    #[error("Encoding error: {0}")]
    EncodingFailed(String),

    #[error("Invalid aspect ratio {width}:{height}")]
    InvalidAspectRatio { width: u32, height: u32 },

    #[error("Unknown aspect ratio: {0}")]
    UnknownAspectRatio(String),

    #[error("Camera request for {facing} was superseded by a newer request")]
    Superseded { facing: Facing },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CaptureError {
    pub fn acquisition(facing: Facing, reason: impl Into<String>) -> Self {
        Self::DeviceAcquisitionFailed {
            facing,
            reason: reason.into(),
        }
    }

    /// Whether this error should reach the user as a notification.
    ///
    /// A superseded request is an internal outcome of rapid switching and
    /// stays in the logs.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Superseded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_out_of_range_message() {
        let err = CaptureError::ZoomOutOfRange {
            requested: 5.0,
            min: 1.0,
            max: 3.0,
        };
        assert_eq!(
            err.to_string(),
            "Zoom level 5 is out of the supported range (1 - 3)"
        );
    }

    #[test]
    fn test_acquisition_message_names_facing() {
        let err = CaptureError::acquisition(Facing::Front, "permission denied");
        assert_eq!(
            err.to_string(),
            "Failed to acquire front camera: permission denied"
        );
    }

    #[test]
    fn test_superseded_is_not_user_facing() {
        assert!(!CaptureError::Superseded {
            facing: Facing::Back
        }
        .is_user_facing());
        assert!(CaptureError::NoActiveFrame.is_user_facing());
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_string(&CaptureError::ZoomUnsupported).unwrap();
        assert_eq!(json, r#"{"kind":"zoom_unsupported"}"#);
    }
}
