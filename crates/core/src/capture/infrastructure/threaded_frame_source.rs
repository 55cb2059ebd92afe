use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Receiver, Sender};
use log::{debug, error, info};

use crate::capture::domain::capture_device::CaptureDevice;
use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::capture_settings::CaptureSettings;
use crate::capture::domain::frame_source::FrameSource;
use crate::capture::infrastructure::frame_slot::FrameSlot;
use crate::shared::frame::Frame;

/// Frame source backed by one background acquisition thread.
///
/// The thread owns the device, advances it every poll interval and publishes
/// the still-encoded frame into a single slot. `grab_frame` decodes the
/// latest one on the caller's thread.
pub struct ThreadedFrameSource {
    slot: Arc<FrameSlot>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadedFrameSource {
    /// Opens the platform camera described by `settings`.
    #[cfg(feature = "camera")]
    pub fn open(settings: &CaptureSettings) -> Result<Self, CaptureError> {
        use crate::capture::infrastructure::nokhwa_device::NokhwaDevice;

        let device_settings = settings.clone();
        Self::spawn(settings, move || NokhwaDevice::open(&device_settings))
    }

    /// Starts the acquisition thread.
    ///
    /// `open_device` runs on the new thread, so the device itself never has
    /// to cross threads. Blocks until the open has succeeded or failed.
    pub fn spawn<D, F>(settings: &CaptureSettings, open_device: F) -> Result<Self, CaptureError>
    where
        D: CaptureDevice + 'static,
        F: FnOnce() -> Result<D, CaptureError> + Send + 'static,
    {
        let slot = Arc::new(FrameSlot::new());
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), CaptureError>>(1);

        let poll_interval = settings.poll_interval();
        let max_failures = settings.max_consecutive_failures;
        let device_label = settings.device.to_string();
        let thread_slot = Arc::clone(&slot);

        let handle = thread::Builder::new()
            .name("facerange-capture".to_string())
            .spawn(move || {
                let mut device = match open_device() {
                    Ok(device) => {
                        let _ = ready_tx.send(Ok(()));
                        device
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                acquire(
                    &mut device,
                    &thread_slot,
                    &stop_rx,
                    poll_interval,
                    max_failures,
                );
                device.close();
                debug!("Capture thread exiting");
            })
            .map_err(|e| CaptureError::DeviceUnavailable {
                device: device_label.clone(),
                reason: format!("failed to spawn capture thread: {e}"),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!(
                    "Capture started on device {} (poll every {}ms)",
                    device_label,
                    poll_interval.as_millis()
                );
                Ok(Self {
                    slot,
                    stop_tx: Some(stop_tx),
                    handle: Some(handle),
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CaptureError::DeviceUnavailable {
                    device: device_label,
                    reason: "capture thread exited during startup".to_string(),
                })
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

fn acquire<D: CaptureDevice>(
    device: &mut D,
    slot: &FrameSlot,
    stop_rx: &Receiver<()>,
    poll_interval: Duration,
    max_failures: u32,
) {
    let mut failures: u32 = 0;
    loop {
        match device.advance() {
            Ok(frame) => {
                failures = 0;
                slot.publish(Arc::from(frame));
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                debug!("Frame advance failed ({} in a row): {}", failures, e);
                if max_failures > 0 && failures >= max_failures {
                    error!(
                        "Capture device lost after {} consecutive failed reads: {}",
                        failures, e
                    );
                    slot.mark_lost(failures, e.to_string());
                    return;
                }
            }
        }

        match stop_rx.recv_timeout(poll_interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            // Stop request, or the owner went away.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

impl FrameSource for ThreadedFrameSource {
    fn grab_frame(&self) -> Result<Frame, CaptureError> {
        if let Some((failures, last_error)) = self.slot.lost() {
            return Err(CaptureError::DeviceLost {
                failures,
                last_error,
            });
        }
        let captured = self.slot.latest().ok_or(CaptureError::NoFrameAvailable)?;
        captured
            .decode()
            .map_err(|e| CaptureError::Decode(e.to_string()))
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if handle.join().is_err() {
            error!("Capture thread panicked");
        } else {
            info!("Capture stopped");
        }
    }
}

impl Drop for ThreadedFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}
