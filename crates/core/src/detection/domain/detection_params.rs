use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_NMS_IOU: f64 = 0.3;
pub const DEFAULT_MIN_NEIGHBORS: u32 = 0;

/// Tuning knobs handed to a face detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Minimum score for a candidate box (0.0-1.0).
    pub confidence: f64,
    /// Overlap above which a weaker candidate is merged into a stronger one.
    pub nms_iou: f64,
    /// Overlapping candidates a kept box must have absorbed. Isolated,
    /// unsupported hits are dropped when this is above zero.
    pub min_neighbors: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            nms_iou: DEFAULT_NMS_IOU,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
        }
    }
}

impl DetectionParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            ));
        }
        if !(0.0..=1.0).contains(&self.nms_iou) {
            return Err(format!(
                "NMS IoU threshold must be between 0.0 and 1.0, got {}",
                self.nms_iou
            ));
        }
        Ok(())
    }
}
