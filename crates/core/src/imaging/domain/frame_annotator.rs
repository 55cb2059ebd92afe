use serde::{Deserialize, Serialize};

use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// RGB colours used when drawing face boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayColors {
    /// Every detected face.
    pub face_box: [u8; 3],
    /// The face the distance was measured from.
    pub measured_box: [u8; 3],
}

pub const GREEN: [u8; 3] = [0, 255, 0];
pub const RED: [u8; 3] = [255, 0, 0];

impl Default for OverlayColors {
    fn default() -> Self {
        Self {
            face_box: GREEN,
            measured_box: RED,
        }
    }
}

/// Draws detection results onto a frame in-place.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        faces: &[Region],
        measured: Option<&Region>,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
