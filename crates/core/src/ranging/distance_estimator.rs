use crate::config::RangingConfig;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::face_detector::FaceDetector;
use crate::ranging::domain::ranging_error::RangingError;
use crate::ranging::domain::similar_triangles::{
    calibrate, CalibrationResult, DistanceReading,
};
use crate::shared::frame::Frame;

/// Face detection call-through plus calibrate/estimate for whole frames.
///
/// Holds no state between calls besides its configuration; the calibrated
/// focal length lives in the [`CalibrationResult`] the caller keeps.
pub struct DistanceEstimator {
    detector: Box<dyn FaceDetector>,
    config: RangingConfig,
}

impl DistanceEstimator {
    pub fn new(detector: Box<dyn FaceDetector>, config: RangingConfig) -> Self {
        Self { detector, config }
    }

    pub fn config(&self) -> &RangingConfig {
        &self.config
    }

    /// Runs the detector on a grayscale copy of `frame`.
    pub fn detect_faces(&mut self, frame: &Frame) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let gray = frame.to_grayscale();
        let regions = self.detector.detect(&gray)?;
        Ok(DetectionResult::new(regions))
    }

    /// Calibrates from a reference frame shot at the configured known distance.
    ///
    /// Returns the detections alongside so callers can annotate the frame.
    pub fn calibrate_from_frame(
        &mut self,
        frame: &Frame,
    ) -> Result<(CalibrationResult, DetectionResult), Box<dyn std::error::Error>> {
        let detections = self.detect_faces(frame)?;
        let face = detections
            .select(self.config.face_selection)
            .ok_or(RangingError::NoFaceInReference)?;
        log::debug!(
            "Reference face widths: {:?}, using {}px",
            detections.widths(),
            face.width
        );
        let calibration = calibrate(
            self.config.known_distance_cm,
            self.config.known_width_cm,
            face.width as f64,
        )?;
        Ok((calibration, detections))
    }

    /// Detects faces in a live frame and ranges the selected one.
    ///
    /// `Ok(None)` when the frame holds no face.
    pub fn measure(
        &mut self,
        frame: &Frame,
        calibration: &CalibrationResult,
    ) -> Result<(Option<DistanceReading>, DetectionResult), Box<dyn std::error::Error>> {
        let detections = self.detect_faces(frame)?;
        let reading = match detections.select(self.config.face_selection) {
            None => None,
            Some(face) => {
                let distance_cm = calibration.estimate(self.config.known_width_cm, face.width as f64)?;
                Some(DistanceReading {
                    distance_cm,
                    region: *face,
                })
            }
        };
        Ok((reading, detections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_result::FaceSelection;
    use crate::shared::region::Region;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubDetector {
        regions: Vec<Region>,
        seen_channels: Arc<Mutex<Vec<u8>>>,
    }

    impl StubDetector {
        fn new(regions: Vec<Region>) -> Self {
            Self {
                regions,
                seen_channels: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            self.seen_channels.lock().unwrap().push(frame.channels());
            Ok(self.regions.clone())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Err("inference failed".into())
        }
    }

    // --- Helpers ---

    fn make_frame() -> Frame {
        Frame::new(vec![128; 320 * 240 * 3], 320, 240, 3)
    }

    fn config(selection: FaceSelection) -> RangingConfig {
        RangingConfig {
            known_distance_cm: 90.0,
            known_width_cm: 15.0,
            face_selection: selection,
        }
    }

    // --- Tests ---

    #[test]
    fn test_detector_receives_grayscale() {
        let detector = StubDetector::new(vec![]);
        let seen = detector.seen_channels.clone();
        let mut estimator = DistanceEstimator::new(Box::new(detector), config(FaceSelection::First));

        estimator.detect_faces(&make_frame()).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_zero_faces_is_empty_not_error() {
        let mut estimator =
            DistanceEstimator::new(Box::new(StubDetector::new(vec![])), config(FaceSelection::First));
        let cal = calibrate(90.0, 15.0, 120.0).unwrap();

        let (reading, detections) = estimator.measure(&make_frame(), &cal).unwrap();

        assert!(reading.is_none());
        assert!(detections.is_empty());
    }

    #[test]
    fn test_calibrate_from_frame_uses_known_distance_and_width() {
        let mut estimator = DistanceEstimator::new(
            Box::new(StubDetector::new(vec![Region::new(10, 10, 120, 130)])),
            config(FaceSelection::First),
        );

        let (cal, detections) = estimator.calibrate_from_frame(&make_frame()).unwrap();

        assert_relative_eq!(cal.focal_length(), 720.0);
        assert_eq!(detections.len(), 1);
    }

    #[test]
    fn test_calibrate_from_frame_without_face_fails() {
        let mut estimator =
            DistanceEstimator::new(Box::new(StubDetector::new(vec![])), config(FaceSelection::First));

        let err = estimator.calibrate_from_frame(&make_frame()).unwrap_err();

        assert_eq!(
            err.downcast_ref::<RangingError>(),
            Some(&RangingError::NoFaceInReference)
        );
    }

    #[test]
    fn test_measure_widest_face() {
        let mut estimator = DistanceEstimator::new(
            Box::new(StubDetector::new(vec![
                Region::new(0, 0, 30, 30),
                Region::new(50, 50, 60, 60),
            ])),
            config(FaceSelection::Widest),
        );
        let cal = CalibrationResult::from_focal_length(720.0).unwrap();

        let (reading, _) = estimator.measure(&make_frame(), &cal).unwrap();

        let reading = reading.unwrap();
        assert_relative_eq!(reading.distance_cm, 180.0);
        assert_eq!(reading.region, Region::new(50, 50, 60, 60));
    }

    #[test]
    fn test_measure_first_face() {
        let mut estimator = DistanceEstimator::new(
            Box::new(StubDetector::new(vec![
                Region::new(0, 0, 30, 30),
                Region::new(50, 50, 60, 60),
            ])),
            config(FaceSelection::First),
        );
        let cal = CalibrationResult::from_focal_length(720.0).unwrap();

        let (reading, _) = estimator.measure(&make_frame(), &cal).unwrap();

        assert_relative_eq!(reading.unwrap().distance_cm, 360.0);
    }

    #[test]
    fn test_zero_width_box_is_invalid_measurement() {
        let mut estimator = DistanceEstimator::new(
            Box::new(StubDetector::new(vec![Region::new(0, 0, 0, 10)])),
            config(FaceSelection::First),
        );
        let cal = CalibrationResult::from_focal_length(720.0).unwrap();

        let err = estimator.measure(&make_frame(), &cal).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RangingError>(),
            Some(RangingError::InvalidMeasurement { .. })
        ));
    }

    #[test]
    fn test_detector_errors_propagate() {
        let mut estimator =
            DistanceEstimator::new(Box::new(FailingDetector), config(FaceSelection::First));
        let err = estimator.detect_faces(&make_frame()).unwrap_err();
        assert_eq!(err.to_string(), "inference failed");
    }
}
