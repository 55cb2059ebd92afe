use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangingError {
    #[error(
        "invalid calibration input: distance {measured_distance_cm} cm, \
         width {real_width_cm} cm, observed {observed_pixel_width} px (all must be positive and finite)"
    )]
    InvalidCalibrationInput {
        measured_distance_cm: f64,
        real_width_cm: f64,
        observed_pixel_width: f64,
    },
    #[error(
        "invalid measurement: focal length {focal_length}, width {real_width_cm} cm, \
         observed {observed_pixel_width} px (all must be positive and finite)"
    )]
    InvalidMeasurement {
        focal_length: f64,
        real_width_cm: f64,
        observed_pixel_width: f64,
    },
    #[error("invalid focal length {0} (must be positive and finite)")]
    InvalidFocalLength(f64),
    #[error("no face found in the reference image")]
    NoFaceInReference,
}
