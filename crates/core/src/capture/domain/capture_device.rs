use std::fmt;

use crate::shared::frame::Frame;

pub type DeviceError = Box<dyn std::error::Error + Send + Sync>;

/// A frame the device has advanced to but not yet decoded.
///
/// Held behind an `Arc` and shared between the acquisition thread and the
/// reader, so it must be immutable and thread-safe.
pub trait CapturedFrame: Send + Sync {
    fn decode(&self) -> Result<Frame, DeviceError>;
}

/// A raw capture device, driven by a single acquisition thread.
///
/// Not required to be `Send`: platform camera handles often are not, so
/// devices are created on the thread that polls them.
pub trait CaptureDevice {
    /// Advances to the next frame and hands back its encoded form.
    fn advance(&mut self) -> Result<Box<dyn CapturedFrame>, DeviceError>;

    /// Releases the device stream. Default: no-op.
    fn close(&mut self) {}
}

/// A camera the platform reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub index: u32,
    pub name: String,
    pub description: String,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}
