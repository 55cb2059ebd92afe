use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for face detection.
///
/// The detector is an opaque external capability: it receives a frame
/// (RGB or single-channel luma) and returns zero or more face boxes in
/// image coordinates. Implementations may hold inference sessions that need
/// exclusive access, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
