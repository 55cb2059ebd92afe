use log::{info, warn};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution as NokhwaResolution,
};
use nokhwa::{query, Buffer, Camera};

use crate::capture::domain::capture_device::{
    CaptureDevice, CapturedFrame, DeviceError, DeviceInfo,
};
use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::capture_settings::{CaptureSettings, DeviceId};
use crate::shared::frame::Frame;

/// Platform camera opened through nokhwa.
pub struct NokhwaDevice {
    camera: Camera,
    streaming: bool,
}

impl NokhwaDevice {
    /// Opens the device and starts its stream.
    ///
    /// Tries MJPEG, then NV12, then lets the driver choose, since cameras
    /// differ in which formats they accept at the requested resolution.
    pub fn open(settings: &CaptureSettings) -> Result<Self, CaptureError> {
        let index = camera_index(&settings.device);
        let mut camera = open_with_fallback(&index, settings)?;

        camera
            .open_stream()
            .map_err(|e| CaptureError::DeviceUnavailable {
                device: settings.device.to_string(),
                reason: format!("failed to open stream: {e}"),
            })?;

        let resolution = camera.resolution();
        info!(
            "Camera {} opened: {}x{} @ {} fps ({})",
            settings.device,
            resolution.width(),
            resolution.height(),
            camera.frame_rate(),
            camera.info().human_name()
        );

        Ok(Self {
            camera,
            streaming: true,
        })
    }
}

fn camera_index(device: &DeviceId) -> CameraIndex {
    match device {
        DeviceId::Index(i) => CameraIndex::Index(*i),
        DeviceId::Name(name) => CameraIndex::String(name.clone()),
    }
}

fn open_with_fallback(index: &CameraIndex, settings: &CaptureSettings) -> Result<Camera, CaptureError> {
    let resolution = NokhwaResolution::new(settings.resolution.width, settings.resolution.height);
    let attempts = [
        RequestedFormatType::Closest(CameraFormat::new(
            resolution,
            FrameFormat::MJPEG,
            settings.fps,
        )),
        RequestedFormatType::Closest(CameraFormat::new(
            resolution,
            FrameFormat::NV12,
            settings.fps,
        )),
        RequestedFormatType::AbsoluteHighestResolution,
    ];

    let mut last_error = String::from("no format accepted");
    for requested in attempts {
        match Camera::new(index.clone(), RequestedFormat::new::<RgbFormat>(requested)) {
            Ok(camera) => return Ok(camera),
            Err(e) => {
                warn!("Camera {} rejected {:?}: {}", settings.device, requested, e);
                last_error = e.to_string();
            }
        }
    }

    let lower = last_error.to_lowercase();
    let reason = if ["permission", "denied", "authorization"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        format!("camera access was denied ({last_error}); grant camera permission and retry")
    } else {
        last_error
    };
    Err(CaptureError::DeviceUnavailable {
        device: settings.device.to_string(),
        reason,
    })
}

/// One still-encoded frame as delivered by the driver.
struct NokhwaFrame(Buffer);

impl CapturedFrame for NokhwaFrame {
    fn decode(&self) -> Result<Frame, DeviceError> {
        let rgb = self.0.decode_image::<RgbFormat>()?;
        let (width, height) = (rgb.width(), rgb.height());
        Ok(Frame::new(rgb.into_raw(), width, height, 3))
    }
}

impl CaptureDevice for NokhwaDevice {
    fn advance(&mut self) -> Result<Box<dyn CapturedFrame>, DeviceError> {
        let buffer = self.camera.frame()?;
        Ok(Box::new(NokhwaFrame(buffer)))
    }

    fn close(&mut self) {
        if !self.streaming {
            return;
        }
        self.streaming = false;
        if let Err(e) = self.camera.stop_stream() {
            warn!("Failed to stop camera stream: {}", e);
        }
    }
}

impl Drop for NokhwaDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// Lists the cameras the platform reports. An empty list is not an error.
pub fn list_devices() -> Result<Vec<DeviceInfo>, CaptureError> {
    let devices = query(ApiBackend::Auto).map_err(|e| CaptureError::Query(e.to_string()))?;

    Ok(devices
        .into_iter()
        .enumerate()
        .map(|(position, d)| DeviceInfo {
            index: d.index().as_index().unwrap_or(position as u32),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}
