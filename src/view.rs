//! The capture view: one camera session plus its gallery.
//!
//! Mirrors the lifecycle of the on-screen widget. `mount` opens the default
//! camera, captures land in the gallery, and `teardown` (or drop) releases
//! the camera.

use crate::config::{CrabSnapConfig, ZoomSliderConfig};
use crate::errors::CaptureError;
use crate::gallery::{GalleryStore, GalleryVisibility};
use crate::media::MediaBackend;
use crate::session::{CaptureSession, SessionEvent};
use crate::types::{AspectRatio, CapturedImage, Facing, ZoomRange};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything the presentation layer needs to render one frame of UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub facing: Facing,
    pub live: bool,
    pub switch_pending: bool,
    pub zoom_level: f64,
    pub zoom_range: Option<ZoomRange>,
    pub zoom_slider: ZoomSliderConfig,
    pub selected_ratio: AspectRatio,
    pub aspect_ratios: Vec<AspectRatio>,
    /// CSS `aspect-ratio` value for the preview element.
    pub preview_aspect: String,
    pub gallery: GalleryVisibility,
    pub gallery_len: usize,
}

pub struct CaptureView {
    config: CrabSnapConfig,
    session: CaptureSession,
    gallery: GalleryStore,
}

impl CaptureView {
    pub fn new(backend: Arc<dyn MediaBackend>, config: CrabSnapConfig) -> Self {
        let session = CaptureSession::new(backend, &config);
        Self {
            config,
            session,
            gallery: GalleryStore::new(),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe_events()
    }

    /// Open the configured default camera.
    pub async fn mount(&self) -> Result<(), CaptureError> {
        self.session
            .start_session(self.config.camera.default_facing)
            .await
    }

    /// Release the camera and forget captured images.
    pub fn teardown(&mut self) {
        self.session.stop_session();
        self.gallery.clear();
    }

    pub async fn switch_camera(&self) -> Result<(), CaptureError> {
        self.session.switch_facing().await
    }

    pub async fn set_zoom(&self, zoom: f64) -> Result<(), CaptureError> {
        self.session.set_zoom(zoom).await
    }

    pub fn select_aspect_ratio(&self, label: &str) -> Result<(), CaptureError> {
        self.session.select_aspect_ratio(label)
    }

    /// Capture the current frame into the gallery and return its index.
    pub fn capture(&mut self) -> Result<usize, CaptureError> {
        let image = self.session.capture_frame()?;
        Ok(self.gallery.append(image))
    }

    /// Delete by position; out-of-range indexes are ignored.
    pub fn delete_image(&mut self, index: usize) -> Option<CapturedImage> {
        self.gallery.delete_at(index)
    }

    pub fn toggle_gallery(&mut self) -> GalleryVisibility {
        self.gallery.toggle_visibility()
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn gallery(&self) -> &GalleryStore {
        &self.gallery
    }

    pub fn snapshot(&self) -> ViewState {
        let session = self.session.snapshot();
        ViewState {
            facing: session.facing,
            live: session.live,
            switch_pending: session.switch_pending,
            zoom_level: session.zoom_level,
            zoom_range: session.zoom_range,
            zoom_slider: self.config.zoom.clone(),
            preview_aspect: session.selected_ratio.css_value(),
            selected_ratio: session.selected_ratio,
            aspect_ratios: self.session.aspect_ratios().to_vec(),
            gallery: self.gallery.visibility(),
            gallery_len: self.gallery.len(),
        }
    }
}
