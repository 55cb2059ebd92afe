use std::path::Path;

use crate::detection::domain::detection_result::DetectionResult;
use crate::imaging::domain::frame_annotator::FrameAnnotator;
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::ranging::distance_estimator::DistanceEstimator;

/// Still-image detection: read → detect → (annotate → write).
///
/// Lets users check the detector against an image before calibrating.
pub struct DetectUseCase {
    reader: Box<dyn ImageReader>,
    image_writer: Box<dyn ImageWriter>,
    annotator: Box<dyn FrameAnnotator>,
}

impl DetectUseCase {
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

    pub fn execute(
        &self,
        estimator: &mut DistanceEstimator,
        input_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let mut frame = self.reader.read(input_path)?;
        let detections = estimator.detect_faces(&frame)?;
        log::info!(
            "{} face(s) detected in {}",
            detections.len(),
            input_path.display()
        );

        if let Some(output) = output_path {
            let selected = detections.select(estimator.config().face_selection);
            self.annotator
                .annotate(&mut frame, detections.regions(), selected)?;
            self.image_writer.write(output, &frame)?;
        }

        Ok(detections)
    }
}
