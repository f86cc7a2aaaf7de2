//! In-process camera backend producing gradient frames.
//!
//! Behaves like a browser media stack with one camera per facing: each stream
//! holds a single video track that stays live until stopped, so leaked
//! streams show up in [`SyntheticBackend::live_streams`].

use super::{MediaBackend, MediaStream, VideoTrack};
use crate::errors::CaptureError;
use crate::testing::{synthetic_frame, ReferenceDevices};
use crate::types::{Facing, MediaConstraints, RawFrame, TrackCapabilities, ZoomRange};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Characteristics of one synthetic camera.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub label: String,
    pub resolution: (u32, u32),
    pub zoom: Option<ZoomRange>,
    /// Time `acquire` takes before resolving.
    pub acquire_delay: Duration,
}

impl DeviceProfile {
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            resolution: (width, height),
            zoom: None,
            acquire_delay: Duration::ZERO,
        }
    }

    pub fn with_zoom(mut self, min: f64, max: f64) -> Self {
        self.zoom = Some(ZoomRange::new(min, max));
        self
    }

    pub fn with_acquire_delay(mut self, delay: Duration) -> Self {
        self.acquire_delay = delay;
        self
    }
}

/// How the backend answers stream requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    Grant,
    PermissionDenied,
    DeviceBusy,
}

struct Shared {
    devices: Mutex<HashMap<Facing, DeviceProfile>>,
    mode: Mutex<AcquireMode>,
    requests: Mutex<Vec<MediaConstraints>>,
    last_zoom: Mutex<Option<f64>>,
    reject_zoom: AtomicBool,
    live_streams: AtomicUsize,
    acquired_streams: AtomicUsize,
    peak_live_streams: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub struct SyntheticBackend {
    shared: Arc<Shared>,
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        let devices = ReferenceDevices::default();
        Self::with_devices(Some(devices.front), Some(devices.back))
    }
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(front: Option<DeviceProfile>, back: Option<DeviceProfile>) -> Self {
        let mut devices = HashMap::new();
        if let Some(front) = front {
            devices.insert(Facing::Front, front);
        }
        if let Some(back) = back {
            devices.insert(Facing::Back, back);
        }

        Self {
            shared: Arc::new(Shared {
                devices: Mutex::new(devices),
                mode: Mutex::new(AcquireMode::Grant),
                requests: Mutex::new(Vec::new()),
                last_zoom: Mutex::new(None),
                reject_zoom: AtomicBool::new(false),
                live_streams: AtomicUsize::new(0),
                acquired_streams: AtomicUsize::new(0),
                peak_live_streams: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_mode(&self, mode: AcquireMode) {
        *lock(&self.shared.mode) = mode;
    }

    /// Replace or remove the camera for `facing`.
    pub fn set_device(&self, facing: Facing, profile: Option<DeviceProfile>) {
        let mut devices = lock(&self.shared.devices);
        match profile {
            Some(profile) => devices.insert(facing, profile),
            None => devices.remove(&facing),
        };
    }

    /// Make every zoom constraint fail at the track level.
    pub fn set_reject_zoom(&self, reject: bool) {
        self.shared.reject_zoom.store(reject, Ordering::SeqCst);
    }

    /// Streams acquired and not yet stopped.
    pub fn live_streams(&self) -> usize {
        self.shared.live_streams.load(Ordering::SeqCst)
    }

    /// Highest number of streams that were live at the same time.
    pub fn peak_live_streams(&self) -> usize {
        self.shared.peak_live_streams.load(Ordering::SeqCst)
    }

    /// Streams handed out since creation.
    pub fn acquired_streams(&self) -> usize {
        self.shared.acquired_streams.load(Ordering::SeqCst)
    }

    /// Every constraint set requested so far, in order.
    pub fn requests(&self) -> Vec<MediaConstraints> {
        lock(&self.shared.requests).clone()
    }

    /// Last zoom value a track accepted.
    pub fn last_applied_zoom(&self) -> Option<f64> {
        *lock(&self.shared.last_zoom)
    }
}

#[async_trait]
impl MediaBackend for SyntheticBackend {
    async fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn MediaStream>, CaptureError> {
        lock(&self.shared.requests).push(constraints.clone());

        let facing = constraints.facing().ok_or_else(|| {
            CaptureError::acquisition(
                Facing::default(),
                format!("unsupported facing mode: {}", constraints.video.facing_mode),
            )
        })?;
        let profile = lock(&self.shared.devices).get(&facing).cloned();

        if let Some(delay) = profile.as_ref().map(|p| p.acquire_delay) {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let mode = *lock(&self.shared.mode);
        match mode {
            AcquireMode::Grant => {}
            AcquireMode::PermissionDenied => {
                return Err(CaptureError::acquisition(facing, "permission denied"))
            }
            AcquireMode::DeviceBusy => {
                return Err(CaptureError::acquisition(facing, "device is busy"))
            }
        }

        let profile = profile
            .ok_or_else(|| CaptureError::acquisition(facing, "no matching camera"))?;

        let live = self.shared.live_streams.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.peak_live_streams.fetch_max(live, Ordering::SeqCst);
        self.shared.acquired_streams.fetch_add(1, Ordering::SeqCst);

        let stream = SyntheticStream::new(profile, self.shared.clone());
        log::debug!("Synthetic {} camera granted stream {}", facing, stream.id);
        let stream: Arc<dyn MediaStream> = Arc::new(stream);
        Ok(stream)
    }
}

struct SyntheticStream {
    id: String,
    resolution: (u32, u32),
    track: Arc<SyntheticTrack>,
    frames: AtomicU64,
}

impl SyntheticStream {
    fn new(profile: DeviceProfile, shared: Arc<Shared>) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let track = Arc::new(SyntheticTrack {
            id: uuid::Uuid::new_v4().to_string(),
            label: profile.label.clone(),
            zoom: profile.zoom,
            live: AtomicBool::new(true),
            shared,
        });

        Self {
            id,
            resolution: profile.resolution,
            track,
            frames: AtomicU64::new(0),
        }
    }
}

impl MediaStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>> {
        let track: Arc<dyn VideoTrack> = self.track.clone();
        vec![track]
    }

    fn current_frame(&self) -> Option<RawFrame> {
        if !self.track.is_live() {
            return None;
        }
        let sequence = self.frames.fetch_add(1, Ordering::Relaxed);
        let (width, height) = self.resolution;
        Some(synthetic_frame(sequence, width, height, &self.id))
    }
}

struct SyntheticTrack {
    id: String,
    label: String,
    zoom: Option<ZoomRange>,
    live: AtomicBool,
    shared: Arc<Shared>,
}

#[async_trait]
impl VideoTrack for SyntheticTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    async fn capabilities(&self) -> TrackCapabilities {
        TrackCapabilities { zoom: self.zoom }
    }

    async fn apply_zoom(&self, zoom: f64) -> Result<(), CaptureError> {
        if !self.is_live() {
            return Err(CaptureError::ControlFailed("track has ended".to_string()));
        }
        let range = self.zoom.ok_or_else(|| {
            CaptureError::ControlFailed("zoom constraint is not supported".to_string())
        })?;
        if self.shared.reject_zoom.load(Ordering::SeqCst) || !range.contains(zoom) {
            return Err(CaptureError::ControlFailed(format!(
                "zoom constraint {} could not be satisfied",
                zoom
            )));
        }
        *lock(&self.shared.last_zoom) = Some(zoom);
        Ok(())
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.shared.live_streams.fetch_sub(1, Ordering::SeqCst);
            log::debug!("Synthetic track {} stopped", self.id);
        }
    }
}
