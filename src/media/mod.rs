//! Media device abstraction
//!
//! The capture session talks to the host's camera API only through these
//! traits: a backend hands out streams for a set of constraints, a stream
//! exposes its video tracks and the frame currently shown in its preview.

pub mod synthetic;

use crate::errors::CaptureError;
use crate::types::{MediaConstraints, RawFrame, TrackCapabilities};
use async_trait::async_trait;
use std::sync::Arc;

pub use synthetic::{AcquireMode, DeviceProfile, SyntheticBackend};

/// Source of camera streams (the host's `getUserMedia` equivalent).
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Request a stream matching `constraints`.
    ///
    /// Fails with [`CaptureError::DeviceAcquisitionFailed`] when permission is
    /// denied, no camera matches, or the device is busy.
    async fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn MediaStream>, CaptureError>;
}

/// An acquired camera stream bound to a preview surface.
pub trait MediaStream: Send + Sync {
    fn id(&self) -> &str;

    fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>>;

    /// Frame currently displayed by the preview, if any.
    fn current_frame(&self) -> Option<RawFrame>;

    fn first_video_track(&self) -> Option<Arc<dyn VideoTrack>> {
        self.video_tracks().into_iter().next()
    }

    /// Stop every track, releasing the hardware.
    fn stop_all(&self) {
        for track in self.video_tracks() {
            track.stop();
        }
    }

    fn is_live(&self) -> bool {
        self.video_tracks().iter().any(|track| track.is_live())
    }
}

#[async_trait]
pub trait VideoTrack: Send + Sync {
    fn id(&self) -> &str;

    fn label(&self) -> &str;

    fn is_live(&self) -> bool;

    async fn capabilities(&self) -> TrackCapabilities;

    async fn apply_zoom(&self, zoom: f64) -> Result<(), CaptureError>;

    /// Idempotent.
    fn stop(&self);
}
