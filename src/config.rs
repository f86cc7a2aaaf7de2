//! Configuration management for crabsnap
//!
//! Loads and saves the widget's startup settings: default camera, encoder
//! quality, zoom slider bounds and the aspect-ratio set.

use crate::errors::CaptureError;
use crate::types::{default_aspect_ratios, AspectRatio, Facing};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrabSnapConfig {
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub zoom: ZoomSliderConfig,
    /// Ratio picker entries, in display order. The first one is selected at startup.
    pub aspect_ratios: Vec<AspectRatio>,
}

/// Camera request configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera opened when the view mounts
    pub default_facing: Facing,
    /// Ask the device for zoom control when requesting a stream
    pub request_zoom: bool,
}

/// Still capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

/// Zoom slider bounds shown by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSliderConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            default_facing: Facing::Back,
            request_zoom: true,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { jpeg_quality: 92 }
    }
}

impl Default for ZoomSliderConfig {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 5.0,
            step: 0.1,
        }
    }
}

impl Default for CrabSnapConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            capture: CaptureConfig::default(),
            zoom: ZoomSliderConfig::default(),
            aspect_ratios: default_aspect_ratios(),
        }
    }
}

impl CrabSnapConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CaptureError::Config(format!("Failed to read config file: {}", e)))?;

        let config: CrabSnapConfig = toml::from_str(&contents)
            .map_err(|e| CaptureError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(CaptureError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CaptureError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CaptureError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CaptureError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CaptureError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabsnap.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }

        let zoom = &self.zoom;
        if !(zoom.min.is_finite() && zoom.max.is_finite()) || zoom.min >= zoom.max {
            return Err("Zoom slider min must be below max".to_string());
        }
        if !(zoom.step > 0.0 && zoom.step <= zoom.max - zoom.min) {
            return Err("Zoom slider step must be positive and fit the range".to_string());
        }

        if self.aspect_ratios.is_empty() {
            return Err("At least one aspect ratio is required".to_string());
        }
        let mut labels = HashSet::new();
        for ratio in &self.aspect_ratios {
            ratio.validate().map_err(|e| e.to_string())?;
            if !labels.insert(ratio.label.as_str()) {
                return Err(format!("Duplicate aspect ratio label: {}", ratio.label));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CrabSnapConfig::default();
        assert_eq!(config.camera.default_facing, Facing::Back);
        assert_eq!(config.capture.jpeg_quality, 92);
        assert_eq!(config.zoom.max, 5.0);
        assert_eq!(config.aspect_ratios[0].label, "1:1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut bad_quality = CrabSnapConfig::default();
        bad_quality.capture.jpeg_quality = 0;
        assert!(bad_quality.validate().is_err());

        let mut bad_zoom = CrabSnapConfig::default();
        bad_zoom.zoom.min = 5.0;
        assert!(bad_zoom.validate().is_err());

        let mut bad_step = CrabSnapConfig::default();
        bad_step.zoom.step = 0.0;
        assert!(bad_step.validate().is_err());

        let mut no_ratios = CrabSnapConfig::default();
        no_ratios.aspect_ratios.clear();
        assert!(no_ratios.validate().is_err());

        let mut duplicate = CrabSnapConfig::default();
        duplicate.aspect_ratios.push(AspectRatio::square());
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("nested").join("crabsnap.toml");

        let mut config = CrabSnapConfig::default();
        config.camera.default_facing = Facing::Front;
        config.aspect_ratios = vec![AspectRatio::wide(), AspectRatio::square()];
        config.save_to_file(&config_path).unwrap();

        let loaded = CrabSnapConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_toml_format() {
        let toml_string = toml::to_string_pretty(&CrabSnapConfig::default()).unwrap();
        assert!(toml_string.contains("[camera]"));
        assert!(toml_string.contains("[capture]"));
        assert!(toml_string.contains("[zoom]"));
        assert!(toml_string.contains("[[aspect_ratios]]"));
        assert!(toml_string.contains("default_facing = \"back\""));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: CrabSnapConfig = toml::from_str("[capture]\njpeg_quality = 70\n").unwrap();
        assert_eq!(config.capture.jpeg_quality, 70);
        assert_eq!(config.aspect_ratios.len(), 4);
        assert!(config.camera.request_zoom);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[capture]\njpeg_quality = 0\n").unwrap();
        assert!(matches!(
            CrabSnapConfig::load_from_file(&path),
            Err(CaptureError::Config(_))
        ));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = CrabSnapConfig::load_from_file("nonexistent_crabsnap.toml");
        assert_eq!(result.unwrap(), CrabSnapConfig::default());
    }
}
