pub mod capture_device;
pub mod capture_error;
pub mod capture_settings;
pub mod frame_source;
