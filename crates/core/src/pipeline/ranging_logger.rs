use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for ranging loop events.
///
/// Keeps the use cases free of output concerns: the CLI logs through the
/// `log` crate, tests use the null logger or inspect recorded values.
pub trait RangingLogger: Send {
    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record the outcome of one processed frame.
    ///
    /// `distance_cm` is `None` when no face was detected.
    fn reading(&mut self, distance_cm: Option<f64>, faces: usize);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullRangingLogger;

impl RangingLogger for NullRangingLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn reading(&mut self, _distance_cm: Option<f64>, _faces: usize) {}
    fn info(&mut self, _message: &str) {}
}

/// Count, sum and extremes of a stream of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStats {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs every reading through the `log` crate and aggregates per-stage
/// timings and distances for an end-of-run summary.
///
/// Only aggregates are kept, so memory does not grow with run length.
pub struct LogRangingLogger {
    timings: HashMap<String, RunningStats>,
    distances: RunningStats,
    frames: usize,
    faceless_frames: usize,
    start_time: Instant,
}

impl LogRangingLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            distances: RunningStats::new(),
            frames: 0,
            faceless_frames: 0,
            start_time: Instant::now(),
        }
    }

    /// Returns the formatted summary, or `None` if no frame was processed.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames;
        let mut lines = vec![format!(
            "Ranging summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, stats) in stages {
            let avg_ms = stats.mean().unwrap_or(0.0);
            let total_ms = stats.sum;
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  max {:6.1}ms  total {total_ms:7.0}ms",
                stats.max
            ));
        }

        if let Some((min, avg, max)) = self.distance_stats() {
            lines.push(format!(
                "  Distance: min {min:.2} / avg {avg:.2} / max {max:.2} cm ({} readings)",
                self.distances.count
            ));
        }
        lines.push(format!("  Frames without a face: {}", self.faceless_frames));

        if elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    /// Minimum, mean and maximum of the recorded distances.
    pub fn distance_stats(&self) -> Option<(f64, f64, f64)> {
        let avg = self.distances.mean()?;
        Some((self.distances.min, avg, self.distances.max))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&RunningStats> {
        self.timings.get(stage)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Default for LogRangingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl RangingLogger for LogRangingLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        match self.timings.get_mut(stage) {
            Some(stats) => stats.push(duration_ms),
            None => {
                let mut stats = RunningStats::new();
                stats.push(duration_ms);
                self.timings.insert(stage.to_string(), stats);
            }
        }
    }

    fn reading(&mut self, distance_cm: Option<f64>, faces: usize) {
        self.frames += 1;
        match distance_cm {
            Some(d) => {
                self.distances.push(d);
                log::info!("Distance = {d:.2} CM");
            }
            None => {
                self.faceless_frames += 1;
                log::debug!("No face detected in frame {} ({faces} candidates)", self.frames);
            }
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
