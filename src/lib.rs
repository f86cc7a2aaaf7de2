//! crabsnap: camera capture widget core
//!
//! Everything behind a "take a photo" widget except the pixels on screen:
//! a live camera session with front/back switching and zoom, a centered
//! aspect-ratio crop with JPEG encoding, and an in-memory gallery of the
//! session's captures.
//!
//! # Features
//! - Pluggable media backend (`getUserMedia`-style acquire, per-track zoom)
//! - Single live stream guarantee, with stale camera requests discarded
//! - 1:1, 3:4, 4:3 and 16:9 crops out of the box, configurable via TOML
//! - Position-addressed gallery with show/hide state
//! - Synthetic camera backend for headless use and tests
//!
//! # Usage
//! ```rust,ignore
//! use crabsnap::{CaptureView, CrabSnapConfig, SyntheticBackend};
//! use std::sync::Arc;
//!
//! let mut view = CaptureView::new(Arc::new(SyntheticBackend::new()), CrabSnapConfig::default());
//! view.mount().await?;
//! view.select_aspect_ratio("16:9")?;
//! let index = view.capture()?;
//! let uri = view.gallery().list()[index].to_data_uri();
//! ```
pub mod config;
pub mod crop;
pub mod errors;
pub mod gallery;
pub mod invariants;
pub mod media;
pub mod session;
pub mod testing;
pub mod types;
pub mod view;

pub use config::CrabSnapConfig;
pub use crop::{crop_and_encode, CropRect, PixelRect};
pub use errors::CaptureError;
pub use gallery::{GalleryEntry, GalleryStore, GalleryVisibility};
pub use media::{MediaBackend, MediaStream, SyntheticBackend, VideoTrack};
pub use session::{CaptureSession, SessionEvent, SessionSnapshot};
pub use types::{
    default_aspect_ratios, AspectRatio, CapturedImage, Facing, MediaConstraints, RawFrame,
    TrackCapabilities, ZoomRange,
};
pub use view::{CaptureView, ViewState};

/// Initialize logging for crabsnap
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabsnap=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "crabsnap");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
