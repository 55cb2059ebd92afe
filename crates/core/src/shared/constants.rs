pub const BLAZEFACE_MODEL_NAME: &str = "blazeface_short_range.onnx";

/// Reference capture distance, camera to face (cm).
pub const DEFAULT_KNOWN_DISTANCE_CM: f64 = 90.0;

/// Real-world face width used for calibration and ranging (cm).
pub const DEFAULT_KNOWN_WIDTH_CM: f64 = 15.0;

pub const DEFAULT_REFERENCE_IMAGE: &str = "reference_image.jpg";

/// Delay between background "advance" calls on the capture device.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5;

/// Consecutive failed advances before the device is considered lost (~1 s at 5 ms).
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 200;

pub const APP_DIR_NAME: &str = "FaceRange";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
