use std::path::Path;

use crate::imaging::domain::frame_annotator::FrameAnnotator;
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::ranging::distance_estimator::DistanceEstimator;
use crate::ranging::domain::similar_triangles::CalibrationResult;

/// Reference-image calibration: read → detect → calibrate → (annotate → write).
pub struct CalibrateUseCase {
    reader: Box<dyn ImageReader>,
    image_writer: Box<dyn ImageWriter>,
    annotator: Box<dyn FrameAnnotator>,
}

impl CalibrateUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        image_writer: Box<dyn ImageWriter>,
        annotator: Box<dyn FrameAnnotator>,
    ) -> Self {
        Self {
            reader,
            image_writer,
            annotator,
        }
    }

    /// Derives the focal length from a photo taken at the configured known
    /// distance. Any failure here is fatal to the caller.
    pub fn execute(
        &self,
        estimator: &mut DistanceEstimator,
        reference_path: &Path,
        annotated_output: Option<&Path>,
    ) -> Result<CalibrationResult, Box<dyn std::error::Error>> {
        let mut frame = self.reader.read(reference_path)?;
        let (calibration, detections) = estimator.calibrate_from_frame(&frame)?;

        log::info!(
            "Calibrated from {}: focal length {:.2}px ({} face(s) in reference)",
            reference_path.display(),
            calibration.focal_length(),
            detections.len()
        );

        if let Some(output) = annotated_output {
            let measured = detections.select(estimator.config().face_selection);
            self.annotator
                .annotate(&mut frame, detections.regions(), measured)?;
            self.image_writer.write(output, &frame)?;
            log::info!("Annotated reference written to {}", output.display());
        }

        Ok(calibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RangingConfig;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::ranging::domain::ranging_error::RangingError;
    use crate::shared::frame::Frame;
    use crate::shared::region::Region;
    use approx::assert_relative_eq;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubImageReader {
        frame: Frame,
    }

    impl ImageReader for StubImageReader {
        fn read(&self, _path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
            Ok(self.frame.clone())
        }
    }

    struct MissingImageReader;

    impl ImageReader for MissingImageReader {
        fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
            Err(format!("Failed to read image {}", path.display()).into())
        }
    }

    type Written = Arc<Mutex<Vec<PathBuf>>>;

    struct StubImageWriter {
        written: Written,
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    type Annotated = Arc<Mutex<Vec<(usize, Option<Region>)>>>;

    struct RecordingAnnotator {
        calls: Annotated,
    }

    impl FrameAnnotator for RecordingAnnotator {
        fn annotate(
            &self,
            _frame: &mut Frame,
            faces: &[Region],
            measured: Option<&Region>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.calls
                .lock()
                .unwrap()
                .push((faces.len(), measured.copied()));
            Ok(())
        }
    }

    struct StubDetector {
        regions: Vec<Region>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Ok(self.regions.clone())
        }
    }

    fn estimator(regions: Vec<Region>) -> DistanceEstimator {
        DistanceEstimator::new(Box::new(StubDetector { regions }), RangingConfig::default())
    }

    fn use_case(reader: Box<dyn ImageReader>) -> (CalibrateUseCase, Written, Annotated) {
        let written = Written::default();
        let annotated = Annotated::default();
        let uc = CalibrateUseCase::new(
            reader,
            Box::new(StubImageWriter {
                written: written.clone(),
            }),
            Box::new(RecordingAnnotator {
                calls: annotated.clone(),
            }),
        );
        (uc, written, annotated)
    }

    fn reference_frame() -> Frame {
        Frame::new(vec![128; 200 * 150 * 3], 200, 150, 3)
    }

    #[test]
    fn test_calibrates_from_reference() {
        let (uc, written, annotated) = use_case(Box::new(StubImageReader {
            frame: reference_frame(),
        }));
        let mut est = estimator(vec![Region::new(40, 20, 120, 120)]);

        let calibration = uc
            .execute(&mut est, Path::new("reference_image.jpg"), None)
            .unwrap();

        assert_relative_eq!(calibration.focal_length(), 720.0);
        assert!(written.lock().unwrap().is_empty());
        assert!(annotated.lock().unwrap().is_empty());
    }

    #[test]
    fn test_writes_annotated_reference() {
        let (uc, written, annotated) = use_case(Box::new(StubImageReader {
            frame: reference_frame(),
        }));
        let small = Region::new(0, 0, 30, 30);
        let large = Region::new(40, 20, 120, 120);
        let mut est = estimator(vec![small, large]);

        uc.execute(
            &mut est,
            Path::new("reference_image.jpg"),
            Some(Path::new("out/annotated.png")),
        )
        .unwrap();

        assert_eq!(
            *written.lock().unwrap(),
            vec![PathBuf::from("out/annotated.png")]
        );
        assert_eq!(*annotated.lock().unwrap(), vec![(2, Some(large))]);
    }

    #[test]
    fn test_no_face_in_reference_is_fatal() {
        let (uc, written, _) = use_case(Box::new(StubImageReader {
            frame: reference_frame(),
        }));
        let mut est = estimator(vec![]);

        let err = uc
            .execute(&mut est, Path::new("ref.jpg"), Some(Path::new("out.png")))
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<RangingError>(),
            Some(&RangingError::NoFaceInReference)
        );
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_reference_propagates() {
        let (uc, _, _) = use_case(Box::new(MissingImageReader));
        let mut est = estimator(vec![Region::new(0, 0, 10, 10)]);

        let err = uc
            .execute(&mut est, Path::new("missing.jpg"), None)
            .unwrap_err();
        assert!(err.to_string().contains("missing.jpg"));
    }
}
