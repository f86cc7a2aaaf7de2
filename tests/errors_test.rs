#[cfg(test)]
mod error_tests {
    use crabsnap::errors::CaptureError;
    use crabsnap::Facing;
    use std::error::Error;

    #[test]
    fn test_acquisition_failed_display() {
        let error = CaptureError::acquisition(Facing::Back, "device is busy");
        assert_eq!(
            error.to_string(),
            "Failed to acquire back camera: device is busy"
        );
    }

    #[test]
    fn test_zoom_errors_display() {
        assert_eq!(
            CaptureError::ZoomUnsupported.to_string(),
            "Zoom is not supported on this device"
        );
        let error = CaptureError::ZoomOutOfRange {
            requested: 4.5,
            min: 1.0,
            max: 3.0,
        };
        assert_eq!(
            error.to_string(),
            "Zoom level 4.5 is out of the supported range (1 - 3)"
        );
    }

    #[test]
    fn test_no_active_frame_display() {
        assert_eq!(
            CaptureError::NoActiveFrame.to_string(),
            "No active camera frame to capture"
        );
    }

    #[test]
    fn test_error_debug_format() {
        let error = CaptureError::EncodingFailed("Debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("EncodingFailed"));
        assert!(debug_str.contains("Debug test"));
    }

    #[test]
    fn test_implements_error_trait() {
        let error = CaptureError::ControlFailed("Error trait test".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_user_facing_classification() {
        let errors = vec![
            CaptureError::acquisition(Facing::Front, "permission denied"),
            CaptureError::ZoomUnsupported,
            CaptureError::ZoomOutOfRange {
                requested: 0.5,
                min: 1.0,
                max: 2.0,
            },
            CaptureError::NoActiveFrame,
            CaptureError::ControlFailed("x".to_string()),
            CaptureError::EncodingFailed("x".to_string()),
            CaptureError::InvalidAspectRatio {
                width: 0,
                height: 1,
            },
            CaptureError::UnknownAspectRatio("x".to_string()),
            CaptureError::Config("x".to_string()),
        ];
        for error in errors {
            assert!(error.is_user_facing(), "{} should be surfaced", error);
        }
        assert!(!CaptureError::Superseded {
            facing: Facing::Front
        }
        .is_user_facing());
    }

    #[test]
    fn test_serialized_warning_payload() {
        let error = CaptureError::ZoomOutOfRange {
            requested: 5.0,
            min: 1.0,
            max: 3.0,
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["kind"], "zoom_out_of_range");
        assert_eq!(json["detail"]["requested"], 5.0);
        assert_eq!(json["detail"]["max"], 3.0);
    }
}
