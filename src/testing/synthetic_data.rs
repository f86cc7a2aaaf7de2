//! Synthetic frame data and reference camera profiles
//!
//! Profiles mirror a typical phone: a 1080p rear camera with a zoom range
//! and a 720p front camera without zoom control.

use crate::media::synthetic::DeviceProfile;
use crate::types::{RawFrame, ZoomRange};
use std::time::Duration;

/// Create an RGB24 gradient frame that changes with `sequence`.
pub fn synthetic_frame(sequence: u64, width: u32, height: u32, stream_id: &str) -> RawFrame {
    let mut data = vec![0u8; width as usize * height as usize * 3];

    let base = (sequence % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = (y as usize * width as usize + x as usize) * 3;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }

    RawFrame::new(data, width, height, stream_id)
}

/// Camera profiles used by the synthetic backend and the CLI demo.
pub struct ReferenceDevices {
    pub front: DeviceProfile,
    pub back: DeviceProfile,
}

impl Default for ReferenceDevices {
    fn default() -> Self {
        Self {
            front: DeviceProfile {
                label: "Synthetic Front Camera".to_string(),
                resolution: (1280, 720),
                zoom: None,
                acquire_delay: Duration::ZERO,
            },
            back: DeviceProfile {
                label: "Synthetic Rear Camera".to_string(),
                resolution: (1920, 1080),
                zoom: Some(ZoomRange::new(1.0, 5.0)),
                acquire_delay: Duration::ZERO,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_frame_correct_size() {
        let frame = synthetic_frame(0, 640, 480, "s");
        assert_eq!(frame.width, 640);
        assert_eq!(frame.height, 480);
        assert_eq!(frame.data.len(), 640 * 480 * 3);
        assert!(frame.has_pixels());
    }

    #[test]
    fn test_synthetic_frames_differ() {
        let frame0 = synthetic_frame(0, 32, 24, "s");
        let frame1 = synthetic_frame(1, 32, 24, "s");
        assert_ne!(frame0.data[0], frame1.data[0]);
    }

    #[test]
    fn test_reference_devices() {
        let devices = ReferenceDevices::default();
        assert_eq!(devices.back.resolution, (1920, 1080));
        assert!(devices.back.zoom.is_some());
        assert!(devices.front.zoom.is_none());
    }
}
