//! Settings file handling.
//!
//! Loaded from `<config_dir>/FaceRange/config.json` or a custom path. Every
//! section and field is optional; missing values take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::domain::capture_settings::CaptureSettings;
use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::detection_result::FaceSelection;
use crate::imaging::domain::frame_annotator::OverlayColors;
use crate::shared::constants::{
    APP_DIR_NAME, BLAZEFACE_MODEL_NAME, DEFAULT_KNOWN_DISTANCE_CM, DEFAULT_KNOWN_WIDTH_CM,
    DEFAULT_REFERENCE_IMAGE,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// Reference geometry for calibration and ranging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangingConfig {
    /// Camera-to-face distance of the reference image (cm).
    pub known_distance_cm: f64,
    /// Real-world face width (cm).
    pub known_width_cm: f64,
    pub face_selection: FaceSelection,
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self {
            known_distance_cm: DEFAULT_KNOWN_DISTANCE_CM,
            known_width_cm: DEFAULT_KNOWN_WIDTH_CM,
            face_selection: FaceSelection::default(),
        }
    }
}

impl RangingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.known_distance_cm.is_finite() && self.known_distance_cm > 0.0) {
            return Err(format!(
                "Known distance must be a positive number of centimetres, got {}",
                self.known_distance_cm
            ));
        }
        if !(self.known_width_cm.is_finite() && self.known_width_cm > 0.0) {
            return Err(format!(
                "Known width must be a positive number of centimetres, got {}",
                self.known_width_cm
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacerangeConfig {
    pub ranging: RangingConfig,
    pub detection: DetectionParams,
    pub capture: CaptureSettings,
    pub overlay: OverlayColors,
    pub reference_image: PathBuf,
    /// Detector model file; resolved from the model cache when unset.
    pub model_path: Option<PathBuf>,
    pub model_name: String,
}

impl Default for FacerangeConfig {
    fn default() -> Self {
        Self {
            ranging: RangingConfig::default(),
            detection: DetectionParams::default(),
            capture: CaptureSettings::default(),
            overlay: OverlayColors::default(),
            reference_image: PathBuf::from(DEFAULT_REFERENCE_IMAGE),
            model_path: None,
            model_name: BLAZEFACE_MODEL_NAME.to_string(),
        }
    }
}

impl FacerangeConfig {
    /// Loads from `path`, or from [`default_path`] when `None`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.clone(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })?;
        config.validate().map_err(ConfigError::Invalid)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Writes the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |e: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.ranging.validate()?;
        self.detection.validate()?;
        self.capture.validate()?;
        Ok(())
    }
}

/// `<config_dir>/FaceRange/config.json`, when the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.json"))
}
