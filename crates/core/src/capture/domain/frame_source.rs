use crate::capture::domain::capture_error::CaptureError;
use crate::shared::frame::Frame;

/// Hands the foreground the most recently acquired frame on demand.
///
/// Last-write-wins: calling faster than frames arrive may return the same
/// frame twice; there is no queue and no frame numbering.
pub trait FrameSource: Send {
    /// Decodes the latest frame.
    ///
    /// Fails with [`CaptureError::NoFrameAvailable`] until the first frame
    /// has been acquired.
    fn grab_frame(&self) -> Result<Frame, CaptureError>;

    /// Stops acquisition and releases the device. Idempotent.
    fn stop(&mut self);
}
