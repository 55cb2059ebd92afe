pub mod frame_slot;
#[cfg(feature = "camera")]
pub mod nokhwa_device;
pub mod threaded_frame_source;
