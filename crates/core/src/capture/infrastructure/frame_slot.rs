use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::capture::domain::capture_device::CapturedFrame;

/// Single-slot, last-write-wins handoff between the acquisition thread and
/// readers.
///
/// The slot holds an immutable `Arc` handle; publishing swaps the pointer and
/// readers clone it, so the lock is only held for a pointer copy and a reader
/// never observes a half-written frame.
#[derive(Default)]
pub struct FrameSlot {
    latest: Mutex<Option<Arc<dyn CapturedFrame>>>,
    lost: Mutex<Option<(u32, String)>>,
    has_frame: AtomicBool,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: Arc<dyn CapturedFrame>) {
        if let Ok(mut slot) = self.latest.lock() {
            *slot = Some(frame);
            self.has_frame.store(true, Ordering::Release);
        }
    }

    pub fn latest(&self) -> Option<Arc<dyn CapturedFrame>> {
        if !self.has_frame.load(Ordering::Acquire) {
            return None;
        }
        self.latest.lock().ok()?.clone()
    }

    /// Records that the device stopped delivering frames.
    pub fn mark_lost(&self, failures: u32, last_error: String) {
        if let Ok(mut lost) = self.lost.lock() {
            *lost = Some((failures, last_error));
        }
    }

    pub fn lost(&self) -> Option<(u32, String)> {
        self.lost.lock().ok()?.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::capture_device::DeviceError;
    use crate::shared::frame::Frame;

    struct Solid(u8);

    impl CapturedFrame for Solid {
        fn decode(&self) -> Result<Frame, DeviceError> {
            Ok(Frame::new(vec![self.0; 3], 1, 1, 3))
        }
    }

    #[test]
    fn test_empty_slot_has_no_frame() {
        assert!(FrameSlot::new().latest().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let slot = FrameSlot::new();
        slot.publish(Arc::new(Solid(1)));
        slot.publish(Arc::new(Solid(2)));
        let frame = slot.latest().unwrap().decode().unwrap();
        assert_eq!(frame.data(), &[2, 2, 2]);
    }

    #[test]
    fn test_repeated_reads_return_same_frame() {
        let slot = FrameSlot::new();
        slot.publish(Arc::new(Solid(7)));
        let a = slot.latest().unwrap();
        let b = slot.latest().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_mark_lost() {
        let slot = FrameSlot::new();
        assert!(slot.lost().is_none());
        slot.mark_lost(5, "unplugged".to_string());
        assert_eq!(slot.lost(), Some((5, "unplugged".to_string())));
    }
}
