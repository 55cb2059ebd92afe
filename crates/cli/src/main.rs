mod logging;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use facerange_core::capture::domain::capture_settings::{DeviceId, Resolution};
use facerange_core::capture::domain::frame_source::FrameSource;
use facerange_core::config::{self, ConfigError, FacerangeConfig};
use facerange_core::detection::domain::detection_result::FaceSelection;
use facerange_core::detection::domain::face_detector::FaceDetector;
use facerange_core::detection::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use facerange_core::imaging::infrastructure::box_annotator::BoxAnnotator;
use facerange_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use facerange_core::imaging::infrastructure::image_file_writer::ImageFileWriter;
use facerange_core::pipeline::calibrate_use_case::CalibrateUseCase;
use facerange_core::pipeline::detect_use_case::DetectUseCase;
use facerange_core::pipeline::live_ranging_use_case::LiveRangingUseCase;
use facerange_core::pipeline::ranging_logger::LogRangingLogger;
use facerange_core::ranging::distance_estimator::DistanceEstimator;
use facerange_core::ranging::domain::similar_triangles::{estimate_distance, CalibrationResult};
use facerange_core::shared::constants::IMAGE_EXTENSIONS;
use facerange_core::shared::model_resolver;

/// Estimate camera-to-face distance from a webcam, calibrated with one
/// reference photo taken at a known distance.
#[derive(Parser)]
#[command(name = "facerange", version)]
struct Cli {
    /// Settings file (default: <config dir>/FaceRange/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the timestamped log file.
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    /// Log to stderr only.
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Calibrate from the reference image, then range faces live (default).
    Run(RunArgs),
    /// Compute the focal length from the reference image.
    Calibrate(CalibrateArgs),
    /// Distance from a known focal length and face width.
    Estimate(EstimateArgs),
    /// Detect faces in a still image.
    Detect(DetectArgs),
    /// List the cameras the platform reports.
    ListCameras,
    /// Show or create the settings file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings as JSON.
    Show,
    /// Write a settings file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Default)]
struct DetectorArgs {
    /// Detector model file (default: resolved from the model cache).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Overlapping candidates a face must absorb to be kept.
    #[arg(long)]
    min_neighbors: Option<u32>,

    /// Face to measure when several are found: widest or first.
    #[arg(long)]
    face_selection: Option<FaceSelection>,
}

#[derive(Args, Default)]
struct CalibrationArgs {
    /// Reference image of a face at the known distance.
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Camera-to-face distance in the reference image (cm).
    #[arg(long)]
    known_distance: Option<f64>,

    /// Real face width (cm).
    #[arg(long)]
    known_width: Option<f64>,

    /// Write the reference image with detected faces outlined.
    #[arg(long)]
    annotate: Option<PathBuf>,
}

#[derive(Args, Default)]
struct RunArgs {
    #[command(flatten)]
    detector: DetectorArgs,

    #[command(flatten)]
    calibration: CalibrationArgs,

    /// Camera index or name.
    #[arg(long)]
    camera: Option<DeviceId>,

    /// Requested capture resolution, WIDTHxHEIGHT.
    #[arg(long)]
    resolution: Option<Resolution>,

    /// Delay between background frame grabs (ms).
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Stop after this many frames (default: run until Ctrl-C).
    #[arg(long)]
    max_frames: Option<usize>,

    /// Skip image calibration and use this focal length (px).
    #[arg(long)]
    focal_length: Option<f64>,
}

#[derive(Args)]
struct CalibrateArgs {
    #[command(flatten)]
    detector: DetectorArgs,

    #[command(flatten)]
    calibration: CalibrationArgs,
}

#[derive(Args)]
struct EstimateArgs {
    /// Calibrated focal length (px).
    #[arg(long)]
    focal_length: f64,

    /// Real face width (cm); defaults to the configured known width.
    #[arg(long)]
    real_width: Option<f64>,

    /// Observed face width (px).
    #[arg(long)]
    pixel_width: f64,
}

#[derive(Args)]
struct DetectArgs {
    /// Image to scan.
    image: PathBuf,

    /// Write the image with detected faces outlined.
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    detector: DetectorArgs,
}

fn main() {
    let cli = Cli::parse();

    let log_dir = (!cli.no_log_file).then_some(cli.log_dir.as_path());
    match logging::init(log_dir) {
        Ok(Some(path)) => log::debug!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(e) => eprintln!("Warning: could not create log file: {e}"),
    }

    if let Err(e) = run(cli) {
        log::error!("{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Init must not depend on the file it is about to replace.
    if let Some(Command::Config(ConfigCommand::Init { force })) = cli.command {
        return init_config(cli.config.as_deref(), force);
    }

    let mut config = FacerangeConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or_else(|| Command::Run(RunArgs::default())) {
        Command::Run(args) => {
            apply_run_args(&mut config, &args);
            validate_run(&config, &args)?;
            run_live(&config, &args)
        }
        Command::Calibrate(args) => {
            apply_detector_args(&mut config, &args.detector);
            apply_calibration_args(&mut config, &args.calibration);
            config.validate()?;
            validate_image_input(&config.reference_image)?;
            run_calibrate(&config, args.calibration.annotate.as_deref())
        }
        Command::Estimate(args) => run_estimate(&config, &args),
        Command::Detect(args) => {
            apply_detector_args(&mut config, &args.detector);
            config.validate()?;
            validate_image_input(&args.image)?;
            run_detect(&config, &args.image, args.output.as_deref())
        }
        Command::ListCameras => run_list_cameras(),
        Command::Config(ConfigCommand::Show) => {
            println!("{}", config.to_json());
            Ok(())
        }
        Command::Config(ConfigCommand::Init { force }) => init_config(cli.config.as_deref(), force),
    }
}

fn apply_detector_args(config: &mut FacerangeConfig, args: &DetectorArgs) {
    if let Some(model) = &args.model {
        config.model_path = Some(model.clone());
    }
    if let Some(confidence) = args.confidence {
        config.detection.confidence = confidence;
    }
    if let Some(min_neighbors) = args.min_neighbors {
        config.detection.min_neighbors = min_neighbors;
    }
    if let Some(selection) = args.face_selection {
        config.ranging.face_selection = selection;
    }
}

fn apply_calibration_args(config: &mut FacerangeConfig, args: &CalibrationArgs) {
    if let Some(reference) = &args.reference {
        config.reference_image = reference.clone();
    }
    if let Some(distance) = args.known_distance {
        config.ranging.known_distance_cm = distance;
    }
    if let Some(width) = args.known_width {
        config.ranging.known_width_cm = width;
    }
}

fn apply_run_args(config: &mut FacerangeConfig, args: &RunArgs) {
    apply_detector_args(config, &args.detector);
    apply_calibration_args(config, &args.calibration);
    if let Some(camera) = &args.camera {
        config.capture.device = camera.clone();
    }
    if let Some(resolution) = args.resolution {
        config.capture.resolution = resolution;
    }
    if let Some(poll) = args.poll_interval_ms {
        config.capture.poll_interval_ms = poll;
    }
}

fn validate_run(config: &FacerangeConfig, args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    if args.max_frames == Some(0) {
        return Err("Max frames must be at least 1".into());
    }
    match args.focal_length {
        Some(f) if !(f.is_finite() && f > 0.0) => {
            Err(format!("Focal length must be a positive number of pixels, got {f}").into())
        }
        Some(_) => Ok(()),
        None => validate_image_input(&config.reference_image),
    }
}

fn validate_image_input(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Image not found: {}", path.display()).into());
    }
    if !is_image(path) {
        return Err(format!(
            "Unsupported image type: {} (expected one of: {})",
            path.display(),
            IMAGE_EXTENSIONS.join(", ")
        )
        .into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn build_estimator(config: &FacerangeConfig) -> Result<DistanceEstimator, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", config.model_name);
    let model_path = model_resolver::resolve(
        &config.model_name,
        config.model_path.as_deref(),
        bundled_models_dir().as_deref(),
    )?;
    let detector: Box<dyn FaceDetector> =
        Box::new(OnnxBlazefaceDetector::new(&model_path, config.detection)?);
    Ok(DistanceEstimator::new(detector, config.ranging))
}

/// `models/` next to the executable.
fn bundled_models_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()?
        .parent()
        .map(|dir| dir.join("models"))
}

fn calibrate_use_case(config: &FacerangeConfig) -> CalibrateUseCase {
    CalibrateUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        Box::new(BoxAnnotator::new(config.overlay)),
    )
}

fn run_calibrate(
    config: &FacerangeConfig,
    annotate: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut estimator = build_estimator(config)?;
    let calibration =
        calibrate_use_case(config).execute(&mut estimator, &config.reference_image, annotate)?;
    println!("Focal length: {:.2}", calibration.focal_length());
    Ok(())
}

fn run_live(config: &FacerangeConfig, args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut estimator = build_estimator(config)?;

    let calibration = match args.focal_length {
        Some(focal_length) => {
            log::info!("Using focal length {focal_length:.2}px, skipping calibration");
            CalibrationResult::from_focal_length(focal_length)?
        }
        None => calibrate_use_case(config).execute(
            &mut estimator,
            &config.reference_image,
            args.calibration.annotate.as_deref(),
        )?,
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, shutting down...");
    })?;

    let source = open_camera(config)?;
    let mut use_case = LiveRangingUseCase::new(
        source,
        Box::new(LogRangingLogger::new()),
        cancel,
        args.max_frames,
    );
    let stats = use_case.execute(&mut estimator, &calibration)?;
    log::info!(
        "Processed {} frames, {} with a distance, {} skipped",
        stats.frames,
        stats.readings,
        stats.errors
    );
    Ok(())
}

#[cfg(feature = "camera")]
fn open_camera(config: &FacerangeConfig) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    use facerange_core::capture::infrastructure::threaded_frame_source::ThreadedFrameSource;
    Ok(Box::new(ThreadedFrameSource::open(&config.capture)?))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_config: &FacerangeConfig) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    Err("This build has no camera support (enable the `camera` feature)".into())
}

fn run_estimate(config: &FacerangeConfig, args: &EstimateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let real_width = args.real_width.unwrap_or(config.ranging.known_width_cm);
    let distance = estimate_distance(args.focal_length, real_width, args.pixel_width)?;
    println!("Distance = {distance:.2} CM");
    Ok(())
}

fn run_detect(
    config: &FacerangeConfig,
    image: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut estimator = build_estimator(config)?;
    let use_case = DetectUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        Box::new(BoxAnnotator::new(config.overlay)),
    );
    let detections = use_case.execute(&mut estimator, image, output)?;

    println!("{} face(s)", detections.len());
    for r in detections.regions() {
        println!("  x={} y={} width={} height={}", r.x, r.y, r.width, r.height);
    }
    if let Some(output) = output {
        log::info!("Output written to {}", output.display());
    }
    Ok(())
}

#[cfg(feature = "camera")]
fn run_list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let devices = facerange_core::capture::infrastructure::nokhwa_device::list_devices()?;
    if devices.is_empty() {
        println!("No cameras found");
    }
    for device in devices {
        println!("{device}");
    }
    Ok(())
}

#[cfg(not(feature = "camera"))]
fn run_list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    Err("This build has no camera support (enable the `camera` feature)".into())
}

fn init_config(explicit: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::default_path().ok_or(ConfigError::NoConfigDir)?,
    };
    if path.exists() && !force {
        return Err(format!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        )
        .into());
    }
    FacerangeConfig::default().save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
