use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_POLL_INTERVAL_MS};

/// Identifies a capture device: platform index or backend-specific name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceId {
    Index(u32),
    Name(String),
}

impl Default for DeviceId {
    fn default() -> Self {
        DeviceId::Index(0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Index(i) => write!(f, "{i}"),
            DeviceId::Name(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for DeviceId {
    type Err = String;

    /// Digits select by index, anything else by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Camera id must not be empty".to_string());
        }
        Ok(match s.parse::<u32>() {
            Ok(index) => DeviceId::Index(index),
            Err(_) => DeviceId::Name(s.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const VGA: Resolution = Resolution {
        width: 640,
        height: 480,
    };
}

impl FromStr for Resolution {
    type Err = String;

    /// Parses `WIDTHxHEIGHT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s.split_once('x').ok_or_else(|| {
            format!("Invalid resolution format '{s}'. Use WIDTHxHEIGHT (e.g., 640x480)")
        })?;
        let width: u32 = w
            .parse()
            .map_err(|_| format!("Invalid width '{w}' in resolution"))?;
        let height: u32 = h
            .parse()
            .map_err(|_| format!("Invalid height '{h}' in resolution"))?;
        if width == 0 || height == 0 {
            return Err("Resolution width and height must be greater than 0".to_string());
        }
        Ok(Resolution { width, height })
    }
}

/// Settings for opening a device and running its acquisition thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub device: DeviceId,
    /// Requested resolution; the driver may pick the closest it supports.
    pub resolution: Resolution,
    /// Requested frame rate hint.
    pub fps: u32,
    /// Delay between background advance calls.
    pub poll_interval_ms: u64,
    /// Consecutive failed advances before the device counts as lost (0 = never).
    pub max_consecutive_failures: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            device: DeviceId::default(),
            resolution: Resolution::VGA,
            fps: 30,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

impl CaptureSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=1000).contains(&self.poll_interval_ms) {
            return Err(format!(
                "Poll interval must be between 1 and 1000 ms, got {}",
                self.poll_interval_ms
            ));
        }
        if !(1..=240).contains(&self.fps) {
            return Err(format!("Frame rate must be between 1 and 240 fps, got {}", self.fps));
        }
        Ok(())
    }
}
