//! Camera Capture Layer
//!
//! Owns the capture device and continuously publishes the newest frame into
//! the shared frame slot. There is no frame queue: if nobody read the
//! previous frame before the next one arrives, the old one is discarded.

pub mod frame;
pub mod replay;

#[cfg(feature = "camera-opencv")]
pub mod camera;

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::shared::ScannerState;
use self::frame::Frame;

/// Camera capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Device index passed to the camera backend
    pub device_index: i32,
    /// Resolutions to request, in priority order
    pub resolutions: Vec<(u32, u32)>,
    /// Fixed sleep between read attempts, to bound CPU usage.
    /// Must stay well under frame latency; sub-20ms.
    pub throttle: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolutions: vec![(1920, 1080), (1280, 720)],
            throttle: Duration::from_millis(5),
        }
    }
}

/// Errors raised by capture backends
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("could not open capture device {0}")]
    DeviceOpen(i32),
    #[error("no usable frames in replay directory {0}")]
    EmptyReplayDir(String),
    #[error("frame read failed: {0}")]
    Read(String),
    #[error("resolution request rejected: {0}")]
    Resolution(String),
}

/// A source of frames: a live camera or a replay of still images.
///
/// Implementations own the underlying device; dropping the source releases it.
pub trait CaptureDevice: Send {
    /// Request a capture resolution. The device is free to ignore it;
    /// callers must check `resolution()` to see what actually took effect.
    fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), CaptureError>;

    /// The resolution the device currently reports
    fn resolution(&self) -> (u32, u32);

    /// Read one frame, copying the pixel data out of the device buffer
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;
}

/// Negotiate a capture resolution against a priority-ordered list.
///
/// Requests each candidate in turn and keeps the first one the device
/// reports back unchanged; otherwise the device default stands.
pub fn negotiate_resolution(device: &mut dyn CaptureDevice, preferred: &[(u32, u32)]) -> (u32, u32) {
    for &(width, height) in preferred {
        if device.set_resolution(width, height).is_err() {
            continue;
        }
        if device.resolution() == (width, height) {
            info!("capture resolution set to {}x{}", width, height);
            return (width, height);
        }
    }

    let (width, height) = device.resolution();
    info!("using device default resolution {}x{}", width, height);
    (width, height)
}

/// Capture loop, run on a dedicated thread for the process lifetime.
///
/// Each iteration reads one frame and publishes a copy into the shared frame
/// slot, replacing any previous value. A failed read skips the iteration;
/// the next read is the implicit retry.
pub fn capture_loop(state: &ScannerState, device: &mut dyn CaptureDevice, throttle: Duration) {
    info!("capture loop started");

    while state.is_running() {
        match device.read_frame() {
            Ok(frame) => state.frame.publish(frame),
            Err(e) => debug!("frame read skipped: {}", e),
        }

        if !throttle.is_zero() {
            std::thread::sleep(throttle);
        }
    }

    info!("capture loop exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Scripted device: plays back a sequence of read results, then fails.
    struct FakeDevice {
        /// Resolutions this device accepts as-is
        supported: Vec<(u32, u32)>,
        current: (u32, u32),
        reads: VecDeque<Result<Frame, CaptureError>>,
    }

    impl FakeDevice {
        fn new(supported: Vec<(u32, u32)>, default: (u32, u32)) -> Self {
            Self {
                supported,
                current: default,
                reads: VecDeque::new(),
            }
        }

        fn push_frame(&mut self, frame: Frame) {
            self.reads.push_back(Ok(frame));
        }

        fn push_failure(&mut self) {
            self.reads
                .push_back(Err(CaptureError::Read("fake read failure".into())));
        }
    }

    impl CaptureDevice for FakeDevice {
        fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), CaptureError> {
            if self.supported.contains(&(width, height)) {
                self.current = (width, height);
            }
            Ok(())
        }

        fn resolution(&self) -> (u32, u32) {
            self.current
        }

        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            self.reads
                .pop_front()
                .unwrap_or_else(|| Err(CaptureError::Read("exhausted".into())))
        }
    }

    fn test_frame(width: u32, height: u32, fill: u8) -> Frame {
        Frame::new(vec![fill; (width * height * 3) as usize], width, height)
    }

    #[test]
    fn test_negotiation_keeps_first_supported() {
        let mut device = FakeDevice::new(vec![(1280, 720)], (640, 480));
        let resolution = negotiate_resolution(&mut device, &[(1920, 1080), (1280, 720)]);
        assert_eq!(resolution, (1280, 720));
    }

    #[test]
    fn test_negotiation_falls_back_to_default() {
        let mut device = FakeDevice::new(vec![], (640, 480));
        let resolution = negotiate_resolution(&mut device, &[(1920, 1080), (1280, 720)]);
        assert_eq!(resolution, (640, 480));
    }

    #[test]
    fn test_negotiation_prefers_earlier_candidates() {
        let mut device = FakeDevice::new(vec![(1920, 1080), (1280, 720)], (640, 480));
        let resolution = negotiate_resolution(&mut device, &[(1920, 1080), (1280, 720)]);
        assert_eq!(resolution, (1920, 1080));
    }

    #[test]
    fn test_capture_publishes_latest_frame() {
        let state = Arc::new(ScannerState::new());
        let mut device = FakeDevice::new(vec![], (4, 4));
        device.push_frame(test_frame(4, 4, 1));
        device.push_frame(test_frame(4, 4, 2));

        let loop_state = state.clone();
        let handle = std::thread::spawn(move || {
            capture_loop(&loop_state, &mut device, Duration::from_millis(1));
        });

        std::thread::sleep(Duration::from_millis(50));
        state.request_stop();
        handle.join().unwrap();

        // Latest wins: the second frame replaced the first.
        let frame = state.frame.snapshot().expect("a frame was published");
        assert_eq!(frame.data[0], 2);
    }

    #[test]
    fn test_read_failures_leave_slot_unchanged() {
        let state = Arc::new(ScannerState::new());
        let mut device = FakeDevice::new(vec![], (4, 4));
        device.push_frame(test_frame(4, 4, 7));
        device.push_failure();
        device.push_failure();
        // Everything after that is a read failure too.

        let loop_state = state.clone();
        let handle = std::thread::spawn(move || {
            capture_loop(&loop_state, &mut device, Duration::from_millis(1));
        });

        std::thread::sleep(Duration::from_millis(50));
        state.request_stop();
        handle.join().unwrap();

        let frame = state.frame.snapshot().expect("last good frame retained");
        assert_eq!(frame.data[0], 7);
    }
}
