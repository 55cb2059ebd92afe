//! Pinhole-camera ranging by similar triangles.
//!
//! A face of real width `W` at distance `D` projects to `P` pixels, so the
//! camera constant `F = P * D / W` is fixed once from a reference shot and any
//! later observation gives `D' = W * F / P'`.

use crate::ranging::domain::ranging_error::RangingError;
use crate::shared::region::Region;

/// Focal length derived from one reference measurement. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationResult {
    focal_length: f64,
}

impl CalibrationResult {
    /// Wraps a focal length known from elsewhere (e.g. an earlier run).
    pub fn from_focal_length(focal_length: f64) -> Result<Self, RangingError> {
        if !is_positive(focal_length) {
            return Err(RangingError::InvalidFocalLength(focal_length));
        }
        Ok(Self { focal_length })
    }

    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }

    pub fn estimate(&self, real_width_cm: f64, observed_pixel_width: f64) -> Result<f64, RangingError> {
        estimate_distance(self.focal_length, real_width_cm, observed_pixel_width)
    }
}

/// One distance measurement and the face box it was taken from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceReading {
    pub distance_cm: f64,
    pub region: Region,
}

/// `focal_length = observed_pixel_width * measured_distance_cm / real_width_cm`
pub fn calibrate(
    measured_distance_cm: f64,
    real_width_cm: f64,
    observed_pixel_width: f64,
) -> Result<CalibrationResult, RangingError> {
    if !is_positive(measured_distance_cm)
        || !is_positive(real_width_cm)
        || !is_positive(observed_pixel_width)
    {
        return Err(RangingError::InvalidCalibrationInput {
            measured_distance_cm,
            real_width_cm,
            observed_pixel_width,
        });
    }
    let focal_length = observed_pixel_width * measured_distance_cm / real_width_cm;
    if !is_positive(focal_length) {
        return Err(RangingError::InvalidCalibrationInput {
            measured_distance_cm,
            real_width_cm,
            observed_pixel_width,
        });
    }
    Ok(CalibrationResult { focal_length })
}

/// `distance_cm = real_width_cm * focal_length / observed_pixel_width`
pub fn estimate_distance(
    focal_length: f64,
    real_width_cm: f64,
    observed_pixel_width: f64,
) -> Result<f64, RangingError> {
    if !is_positive(focal_length) || !is_positive(real_width_cm) || !is_positive(observed_pixel_width)
    {
        return Err(RangingError::InvalidMeasurement {
            focal_length,
            real_width_cm,
            observed_pixel_width,
        });
    }
    let distance_cm = real_width_cm * focal_length / observed_pixel_width;
    if !distance_cm.is_finite() {
        return Err(RangingError::InvalidMeasurement {
            focal_length,
            real_width_cm,
            observed_pixel_width,
        });
    }
    Ok(distance_cm)
}

// Rejects zero, negatives, NaN and infinities.
fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}
