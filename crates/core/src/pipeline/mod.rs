pub mod calibrate_use_case;
pub mod detect_use_case;
pub mod live_ranging_use_case;
pub mod ranging_logger;
