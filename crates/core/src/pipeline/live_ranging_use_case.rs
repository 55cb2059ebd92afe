use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::frame_source::FrameSource;
use crate::pipeline::ranging_logger::RangingLogger;
use crate::ranging::distance_estimator::DistanceEstimator;
use crate::ranging::domain::similar_triangles::CalibrationResult;

/// Idle between polls while the source has nothing new to offer.
const DEFAULT_IDLE: Duration = Duration::from_millis(2);

/// Counters for one live ranging run.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LiveRangingStats {
    /// Frames grabbed and handed to the estimator.
    pub frames: usize,
    /// Frames that produced a distance.
    pub readings: usize,
    /// Per-frame failures that were logged and skipped.
    pub errors: usize,
    pub last_distance_cm: Option<f64>,
}

/// The foreground loop: grab → measure → report, until cancelled.
pub struct LiveRangingUseCase {
    source: Box<dyn FrameSource>,
    logger: Box<dyn RangingLogger>,
    cancel: Arc<AtomicBool>,
    max_frames: Option<usize>,
    idle: Duration,
}

impl LiveRangingUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        logger: Box<dyn RangingLogger>,
        cancel: Arc<AtomicBool>,
        max_frames: Option<usize>,
    ) -> Self {
        Self {
            source,
            logger,
            cancel,
            max_frames,
            idle: DEFAULT_IDLE,
        }
    }

    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Runs until the cancel flag is set, `max_frames` frames have been
    /// processed, or the source fails fatally. The source is always stopped
    /// before returning.
    pub fn execute(
        &mut self,
        estimator: &mut DistanceEstimator,
        calibration: &CalibrationResult,
    ) -> Result<LiveRangingStats, Box<dyn std::error::Error>> {
        self.logger.info(&format!(
            "Ranging with focal length {:.2}px, known width {:.1}cm",
            calibration.focal_length(),
            estimator.config().known_width_cm
        ));

        let result = self.run_loop(estimator, calibration);

        self.source.stop();
        self.logger.summary();
        result
    }

    fn run_loop(
        &mut self,
        estimator: &mut DistanceEstimator,
        calibration: &CalibrationResult,
    ) -> Result<LiveRangingStats, Box<dyn std::error::Error>> {
        let mut stats = LiveRangingStats::default();

        while !self.cancel.load(Ordering::Relaxed) {
            if self.max_frames.is_some_and(|max| stats.frames >= max) {
                break;
            }

            let grab_start = Instant::now();
            let frame = match self.source.grab_frame() {
                Ok(frame) => frame,
                Err(CaptureError::NoFrameAvailable) => {
                    thread::sleep(self.idle);
                    continue;
                }
                Err(e) if e.is_recoverable() => {
                    log::error!("Skipping frame: {e}");
                    stats.errors += 1;
                    thread::sleep(self.idle);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            self.logger
                .timing("grab", grab_start.elapsed().as_secs_f64() * 1000.0);
            stats.frames += 1;

            let measure_start = Instant::now();
            match estimator.measure(&frame, calibration) {
                Ok((reading, detections)) => {
                    self.logger
                        .timing("measure", measure_start.elapsed().as_secs_f64() * 1000.0);
                    let distance = reading.map(|r| r.distance_cm);
                    self.logger.reading(distance, detections.len());
                    if distance.is_some() {
                        stats.readings += 1;
                        stats.last_distance_cm = distance;
                    }
                }
                Err(e) => {
                    log::error!("Failed to range frame {}: {e}", stats.frames);
                    stats.errors += 1;
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RangingConfig;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::pipeline::ranging_logger::NullRangingLogger;
    use crate::shared::frame::Frame;
    use crate::shared::region::Region;
    use approx::assert_relative_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // --- Stubs ---

    /// Plays back scripted grab results, then keeps returning frames.
    /// Raises the cancel flag after `cancel_after` grabs.
    struct ScriptedSource {
        script: VecDeque<Result<Frame, CaptureError>>,
        grabs: Mutex<usize>,
        cancel_after: Option<usize>,
        cancel: Arc<AtomicBool>,
        stopped: Arc<AtomicBool>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Frame, CaptureError>>, cancel: Arc<AtomicBool>) -> Self {
            Self {
                script: script.into(),
                grabs: Mutex::new(0),
                cancel_after: None,
                cancel,
                stopped: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn grab_frame(&self) -> Result<Frame, CaptureError> {
            let mut grabs = self.grabs.lock().unwrap();
            *grabs += 1;
            if self.cancel_after.is_some_and(|n| *grabs >= n) {
                self.cancel.store(true, Ordering::Relaxed);
            }
            let index = *grabs - 1;
            self.script
                .get(index)
                .cloned()
                .unwrap_or_else(|| Ok(frame()))
        }

        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    /// Returns a face whose width is taken from the first pixel value, or
    /// no face for a zero pixel; fails on 255.
    struct PixelDrivenDetector;

    impl FaceDetector for PixelDrivenDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            match frame.data()[0] {
                0 => Ok(vec![]),
                255 => Err("inference failed".into()),
                w => Ok(vec![Region::new(0, 0, w as i32, w as i32)]),
            }
        }
    }

    fn frame() -> Frame {
        face_frame(60)
    }

    fn face_frame(value: u8) -> Frame {
        Frame::new(vec![value; 4 * 4], 4, 4, 1)
    }

    fn estimator() -> DistanceEstimator {
        DistanceEstimator::new(Box::new(PixelDrivenDetector), RangingConfig::default())
    }

    fn calibration() -> CalibrationResult {
        CalibrationResult::from_focal_length(720.0).unwrap()
    }

    type RunOutcome = (
        Result<LiveRangingStats, Box<dyn std::error::Error>>,
        Arc<AtomicBool>,
    );

    fn run(
        source: ScriptedSource,
        cancel: Arc<AtomicBool>,
        max_frames: Option<usize>,
    ) -> RunOutcome {
        let stopped = source.stopped.clone();
        let mut uc = LiveRangingUseCase::new(
            Box::new(source),
            Box::new(NullRangingLogger),
            cancel,
            max_frames,
        )
        .with_idle(Duration::from_millis(0));
        (uc.execute(&mut estimator(), &calibration()), stopped)
    }

    #[test]
    fn test_stops_after_max_frames() {
        let cancel = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource::new(vec![], cancel.clone());

        let (result, stopped) = run(source, cancel, Some(3));
        let stats = result.unwrap();

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.readings, 3);
        // 15cm * 720px / 60px
        assert_relative_eq!(stats.last_distance_cm.unwrap(), 180.0);
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_stops_on_cancel() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut source = ScriptedSource::new(vec![], cancel.clone());
        source.cancel_after = Some(5);

        let (result, stopped) = run(source, cancel, None);

        assert_eq!(result.unwrap().frames, 5);
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_pre_cancelled_processes_nothing() {
        let cancel = Arc::new(AtomicBool::new(true));
        let source = ScriptedSource::new(vec![], cancel.clone());

        let (result, stopped) = run(source, cancel, None);

        assert_eq!(result.unwrap(), LiveRangingStats::default());
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_no_frame_available_is_retried() {
        let cancel = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource::new(
            vec![
                Err(CaptureError::NoFrameAvailable),
                Err(CaptureError::NoFrameAvailable),
                Ok(face_frame(120)),
            ],
            cancel.clone(),
        );

        let (result, _) = run(source, cancel, Some(1));
        let stats = result.unwrap();

        assert_eq!(stats.frames, 1);
        assert_eq!(stats.errors, 0);
        assert_relative_eq!(stats.last_distance_cm.unwrap(), 90.0);
    }

    #[test]
    fn test_device_lost_is_fatal_and_stops_source() {
        let cancel = Arc::new(AtomicBool::new(false));
        let lost = CaptureError::DeviceLost {
            failures: 200,
            last_error: "unplugged".to_string(),
        };
        let source = ScriptedSource::new(vec![Ok(frame()), Err(lost.clone())], cancel.clone());

        let (result, stopped) = run(source, cancel, None);
        let err = result.unwrap_err();

        assert_eq!(err.downcast_ref::<CaptureError>(), Some(&lost));
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_per_frame_failures_are_skipped() {
        let cancel = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource::new(
            vec![
                Err(CaptureError::Decode("corrupt".to_string())),
                Ok(face_frame(255)),
                Ok(face_frame(0)),
                Ok(face_frame(60)),
            ],
            cancel.clone(),
        );

        let (result, _) = run(source, cancel, Some(3));
        let stats = result.unwrap();

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.readings, 1);
    }

    #[test]
    fn test_faceless_frames_are_not_errors() {
        let cancel = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource::new(
            vec![Ok(face_frame(0)), Ok(face_frame(0))],
            cancel.clone(),
        );

        let (result, _) = run(source, cancel, Some(2));
        let stats = result.unwrap();

        assert_eq!(stats.errors, 0);
        assert_eq!(stats.readings, 0);
        assert!(stats.last_distance_cm.is_none());
    }
}
