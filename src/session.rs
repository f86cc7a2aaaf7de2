//! Capture session controller
//!
//! Owns the live camera stream, the facing selection, the zoom value and the
//! aspect-ratio selection. All device access goes through a [`MediaBackend`].
//!
//! Operations take `&self`; state lives behind a mutex that is never held
//! across an await, so a pending acquisition does not block other calls.
//! Overlapping starts are resolved with a request token: only the newest
//! request may install its stream, older results are stopped on arrival.

use crate::assert_invariant;
use crate::config::CrabSnapConfig;
use crate::crop;
use crate::errors::CaptureError;
use crate::invariants::SINGLE_LIVE_STREAM;
use crate::media::{MediaBackend, MediaStream, VideoTrack};
use crate::types::{AspectRatio, CapturedImage, Facing, MediaConstraints, ZoomRange};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Events kept per subscriber before the oldest are dropped.
pub const EVENT_CAPACITY: usize = 64;

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    StreamStarted {
        facing: Facing,
        stream_id: String,
        zoom_range: Option<ZoomRange>,
    },
    StreamStopped {
        stream_id: String,
    },
    ZoomChanged {
        level: f64,
    },
    AspectRatioChanged {
        label: String,
    },
    FrameCaptured {
        width: u32,
        height: u32,
        bytes: usize,
    },
    Warning {
        error: CaptureError,
    },
}

/// Point-in-time view of the session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub facing: Facing,
    pub live: bool,
    pub stream_id: Option<String>,
    pub switch_pending: bool,
    pub zoom_level: f64,
    pub zoom_range: Option<ZoomRange>,
    pub selected_ratio: AspectRatio,
}

struct LiveStream {
    handle: Arc<dyn MediaStream>,
}

struct SessionState {
    facing: Facing,
    live: Option<LiveStream>,
    zoom_level: f64,
    zoom_range: Option<ZoomRange>,
    selected_ratio: AspectRatio,
    latest_request: u64,
    pending_request: Option<u64>,
}

pub struct CaptureSession {
    backend: Arc<dyn MediaBackend>,
    ratios: Vec<AspectRatio>,
    jpeg_quality: u8,
    request_zoom: bool,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl CaptureSession {
    /// Create an idle session. No stream is requested until [`start_session`].
    ///
    /// [`start_session`]: CaptureSession::start_session
    pub fn new(backend: Arc<dyn MediaBackend>, config: &CrabSnapConfig) -> Self {
        let ratios = if config.aspect_ratios.is_empty() {
            crate::types::default_aspect_ratios()
        } else {
            config.aspect_ratios.clone()
        };
        let selected_ratio = ratios[0].clone();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            backend,
            ratios,
            jpeg_quality: config.capture.jpeg_quality,
            request_zoom: config.camera.request_zoom,
            state: Mutex::new(SessionState {
                facing: config.camera.default_facing,
                live: None,
                zoom_level: config.zoom.min,
                zoom_range: None,
                selected_ratio,
                latest_request: 0,
                pending_request: None,
            }),
            events,
        }
    }

    /// Subscribe to session events emitted from now on.
    ///
    /// Events sent while nobody is subscribed are dropped. A subscriber that
    /// falls more than [`EVENT_CAPACITY`] events behind sees `Lagged` and
    /// loses the oldest ones.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Acquire a stream for `facing` and bind it to the preview.
    ///
    /// Any stream still held is released first. When a newer start or a stop
    /// is issued while this one is pending, the acquired stream is stopped
    /// and [`CaptureError::Superseded`] is returned.
    pub async fn start_session(&self, facing: Facing) -> Result<(), CaptureError> {
        self.stop_session();

        let token = {
            let mut state = self.state();
            state.latest_request += 1;
            state.facing = facing;
            state.pending_request = Some(state.latest_request);
            state.latest_request
        };

        log::info!("Requesting {} camera (request {})", facing, token);
        let constraints = MediaConstraints::for_facing(facing, self.request_zoom);

        let stream = match self.backend.acquire(&constraints).await {
            Ok(stream) => stream,
            Err(error) => {
                let current = self.finish_request(token);
                if !current {
                    log::debug!("Ignoring failure of superseded request {}", token);
                    return Err(CaptureError::Superseded { facing });
                }
                log::error!("Error accessing camera: {}", error);
                self.report(&error);
                return Err(error);
            }
        };

        if !self.is_current(token) {
            return Err(self.discard(stream, token, facing));
        }

        let zoom_range = match stream.first_video_track() {
            Some(track) => track.capabilities().await.zoom,
            None => None,
        };

        let stream_id = stream.id().to_string();
        {
            let mut state = self.state();
            if state.latest_request != token {
                drop(state);
                return Err(self.discard(stream, token, facing));
            }

            assert_invariant!(state.live.is_none(), SINGLE_LIVE_STREAM, "session");
            state.live = Some(LiveStream { handle: stream });
            state.pending_request = None;
            state.zoom_range = zoom_range;
            if let Some(range) = zoom_range {
                state.zoom_level = range.min;
            }
        }

        log::info!(
            "Camera stream {} started ({}, zoom {:?})",
            stream_id,
            facing,
            zoom_range
        );
        self.emit(SessionEvent::StreamStarted {
            facing,
            stream_id,
            zoom_range,
        });
        Ok(())
    }

    /// Stop every track of the current stream and clear the handle.
    ///
    /// Also invalidates any start still in flight. No-op without a stream.
    pub fn stop_session(&self) {
        let released = {
            let mut state = self.state();
            state.latest_request += 1;
            state.pending_request = None;
            state.zoom_range = None;
            state.live.take()
        };

        if let Some(live) = released {
            live.handle.stop_all();
            let stream_id = live.handle.id().to_string();
            log::info!("Camera stream {} released", stream_id);
            self.emit(SessionEvent::StreamStopped { stream_id });
        }
    }

    /// Release the current stream and start the other camera.
    pub async fn switch_facing(&self) -> Result<(), CaptureError> {
        let next = self.facing().toggled();
        log::info!("Switching camera to {}", next);
        self.stop_session();
        self.start_session(next).await
    }

    /// Apply `requested` zoom to the live track.
    ///
    /// No-op without a live stream. The track is asked for its capability
    /// again, so the check uses what the device reports right now.
    pub async fn set_zoom(&self, requested: f64) -> Result<(), CaptureError> {
        let (track, token) = {
            let state = self.state();
            match state.live.as_ref() {
                Some(live) => (live.handle.first_video_track(), state.latest_request),
                None => {
                    log::debug!("Ignoring zoom {} without a live stream", requested);
                    return Ok(());
                }
            }
        };

        let track = match track {
            Some(track) => track,
            None => return Err(self.reject(CaptureError::ZoomUnsupported)),
        };

        let range = match track.capabilities().await.zoom {
            Some(range) => range,
            None => return Err(self.reject(CaptureError::ZoomUnsupported)),
        };

        if !range.contains(requested) {
            return Err(self.reject(CaptureError::ZoomOutOfRange {
                requested,
                min: range.min,
                max: range.max,
            }));
        }

        if let Err(error) = track.apply_zoom(requested).await {
            return Err(self.reject(error));
        }

        {
            let mut state = self.state();
            if state.latest_request != token {
                log::debug!("Stream changed while applying zoom {}", requested);
                return Err(CaptureError::Superseded {
                    facing: state.facing,
                });
            }
            state.zoom_range = Some(range);
            state.zoom_level = requested;
        }

        log::debug!("Zoom set to {}", requested);
        self.emit(SessionEvent::ZoomChanged { level: requested });
        Ok(())
    }

    /// Replace the selected aspect ratio. Takes effect on the next capture.
    pub fn set_aspect_ratio(&self, ratio: AspectRatio) -> Result<(), CaptureError> {
        ratio.validate()?;
        let label = ratio.label.clone();
        self.state().selected_ratio = ratio;
        self.emit(SessionEvent::AspectRatioChanged { label });
        Ok(())
    }

    /// Select one of the configured ratios by its label.
    pub fn select_aspect_ratio(&self, label: &str) -> Result<(), CaptureError> {
        let ratio = self
            .ratios
            .iter()
            .find(|r| r.label == label)
            .cloned()
            .ok_or_else(|| CaptureError::UnknownAspectRatio(label.to_string()))?;
        self.set_aspect_ratio(ratio)
    }

    /// Snapshot the preview frame, cropped to the selected ratio, as JPEG.
    pub fn capture_frame(&self) -> Result<CapturedImage, CaptureError> {
        let (handle, ratio) = {
            let state = self.state();
            (
                state.live.as_ref().map(|live| live.handle.clone()),
                state.selected_ratio.clone(),
            )
        };

        let frame = match handle.and_then(|handle| handle.current_frame()) {
            Some(frame) if frame.has_pixels() => frame,
            _ => return Err(self.reject(CaptureError::NoActiveFrame)),
        };

        let image = crop::crop_and_encode(&frame, &ratio, self.jpeg_quality)
            .map_err(|error| self.reject(error))?;

        log::info!(
            "Captured {}x{} frame as {}x{} ({}, {} bytes)",
            frame.width,
            frame.height,
            image.width(),
            image.height(),
            ratio,
            image.size_bytes()
        );
        self.emit(SessionEvent::FrameCaptured {
            width: image.width(),
            height: image.height(),
            bytes: image.size_bytes(),
        });
        Ok(image)
    }

    pub fn facing(&self) -> Facing {
        self.state().facing
    }

    pub fn is_live(&self) -> bool {
        self.state().live.is_some()
    }

    /// True while the newest start request has not resolved.
    pub fn is_switch_pending(&self) -> bool {
        self.state().pending_request.is_some()
    }

    pub fn zoom_level(&self) -> f64 {
        self.state().zoom_level
    }

    pub fn zoom_range(&self) -> Option<ZoomRange> {
        self.state().zoom_range
    }

    pub fn selected_ratio(&self) -> AspectRatio {
        self.state().selected_ratio.clone()
    }

    /// The configured ratio set, in display order.
    pub fn aspect_ratios(&self) -> &[AspectRatio] {
        &self.ratios
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            facing: state.facing,
            live: state.live.is_some(),
            stream_id: state.live.as_ref().map(|live| live.handle.id().to_string()),
            switch_pending: state.pending_request.is_some(),
            zoom_level: state.zoom_level,
            zoom_range: state.zoom_range,
            selected_ratio: state.selected_ratio.clone(),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    fn is_current(&self, token: u64) -> bool {
        self.state().latest_request == token
    }

    /// Clear the pending marker if `token` is still the newest request.
    fn finish_request(&self, token: u64) -> bool {
        let mut state = self.state();
        if state.latest_request != token {
            return false;
        }
        state.pending_request = None;
        true
    }

    fn discard(&self, stream: Arc<dyn MediaStream>, token: u64, facing: Facing) -> CaptureError {
        log::debug!(
            "Request {} for {} camera superseded, stopping stream {}",
            token,
            facing,
            stream.id()
        );
        stream.stop_all();
        CaptureError::Superseded { facing }
    }

    fn reject(&self, error: CaptureError) -> CaptureError {
        log::warn!("{}", error);
        self.report(&error);
        error
    }

    fn report(&self, error: &CaptureError) {
        if error.is_user_facing() {
            self.emit(SessionEvent::Warning {
                error: error.clone(),
            });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // Fails only when nobody is subscribed.
        let _ = self.events.send(event);
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_session();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{AcquireMode, DeviceProfile, SyntheticBackend};

    fn backend() -> SyntheticBackend {
        SyntheticBackend::with_devices(
            Some(DeviceProfile::new("front", 64, 48)),
            Some(DeviceProfile::new("back", 160, 90).with_zoom(1.0, 3.0)),
        )
    }

    fn session(backend: &SyntheticBackend) -> CaptureSession {
        CaptureSession::new(Arc::new(backend.clone()), &CrabSnapConfig::default())
    }

    #[tokio::test]
    async fn test_start_initializes_zoom_to_minimum() {
        let backend = backend();
        let session = session(&backend);
        session.start_session(Facing::Back).await.unwrap();

        assert!(session.is_live());
        assert_eq!(session.zoom_range(), Some(ZoomRange::new(1.0, 3.0)));
        assert_eq!(session.zoom_level(), 1.0);
        assert!(!session.is_switch_pending());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let backend = backend();
        let session = session(&backend);
        session.stop_session();
        session.start_session(Facing::Front).await.unwrap();
        session.stop_session();
        session.stop_session();
        assert!(!session.is_live());
        assert_eq!(backend.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_failed_start_reports_warning() {
        let backend = backend();
        backend.set_mode(AcquireMode::DeviceBusy);
        let session = session(&backend);
        let mut events = session.subscribe_events();

        let result = session.start_session(Facing::Back).await;
        assert!(matches!(
            result,
            Err(CaptureError::DeviceAcquisitionFailed { .. })
        ));
        assert!(!session.is_live());
        assert!(matches!(
            events.try_recv(),
            Ok(SessionEvent::Warning {
                error: CaptureError::DeviceAcquisitionFailed { .. }
            })
        ));
    }

    #[tokio::test]
    async fn test_events_without_subscriber_are_not_kept() {
        let backend = backend();
        let session = session(&backend);
        session.start_session(Facing::Back).await.unwrap();
        for _ in 0..10_000 {
            session.select_aspect_ratio("4:3").unwrap();
        }

        let mut events = session.subscribe_events();
        assert_eq!(events.len(), 0);
        assert_eq!(events.try_recv(), Err(broadcast::error::TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_slow_subscriber_keeps_only_recent_events() {
        let backend = backend();
        let session = session(&backend);
        let mut events = session.subscribe_events();
        for _ in 0..10_000 {
            session.select_aspect_ratio("16:9").unwrap();
        }

        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(_))
        ));
        let mut received = 0;
        while let Ok(event) = events.try_recv() {
            assert_eq!(
                event,
                SessionEvent::AspectRatioChanged {
                    label: "16:9".to_string()
                }
            );
            received += 1;
        }
        assert_eq!(received, EVENT_CAPACITY);
    }

    #[tokio::test]
    async fn test_switch_to_camera_without_zoom_keeps_level() {
        let backend = backend();
        let session = session(&backend);
        session.start_session(Facing::Back).await.unwrap();
        session.set_zoom(2.5).await.unwrap();

        session.switch_facing().await.unwrap();
        assert_eq!(session.zoom_range(), None);
        assert_eq!(session.zoom_level(), 2.5);
    }

    #[tokio::test]
    async fn test_drop_releases_stream() {
        let backend = backend();
        {
            let session = session(&backend);
            session.start_session(Facing::Back).await.unwrap();
            assert_eq!(backend.live_streams(), 1);
        }
        assert_eq!(backend.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_select_unknown_ratio() {
        let backend = backend();
        let session = session(&backend);
        assert_eq!(
            session.select_aspect_ratio("2:1"),
            Err(CaptureError::UnknownAspectRatio("2:1".to_string()))
        );
        session.select_aspect_ratio("16:9").unwrap();
        assert_eq!(session.selected_ratio(), AspectRatio::wide());
    }
}
