use thiserror::Error;

/// Errors surfaced by a [`FrameSource`](super::frame_source::FrameSource).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The device could not be opened. Fatal at startup.
    #[error("capture device {device} unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },
    /// Nothing has been advanced yet. Retry on the next iteration.
    #[error("no frame available yet")]
    NoFrameAvailable,
    /// The device stopped delivering frames. Fatal.
    #[error("capture device lost after {failures} consecutive failed reads: {last_error}")]
    DeviceLost { failures: u32, last_error: String },
    /// The latest frame could not be decoded. Per-frame, non-fatal.
    #[error("failed to decode frame: {0}")]
    Decode(String),
    /// Device enumeration failed.
    #[error("failed to query capture devices: {0}")]
    Query(String),
}

impl CaptureError {
    /// Whether the caller can carry on with the next frame.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CaptureError::NoFrameAvailable | CaptureError::Decode(_))
    }
}
