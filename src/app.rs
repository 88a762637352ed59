//! Application Coordinator
//!
//! Owns the shared state and the worker threads. The lifecycle is explicit:
//! construct the state, spawn the workers, signal shutdown, join. Joining is
//! the grace period before the capture device is released; the device is
//! owned by the capture thread and dropped when its loop exits.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::info;

use crate::capture::{self, CaptureDevice};
use crate::pairing::Pairing;
use crate::shared::ScannerState;
use crate::storage::log::ScanLog;
use crate::vision::{self, Extractor};

/// Main application coordinator
pub struct ScannerApp {
    state: Arc<ScannerState>,
    workers: Vec<JoinHandle<()>>,
}

impl ScannerApp {
    /// Create the shared state; no threads are spawned yet
    pub fn new() -> Self {
        Self {
            state: Arc::new(ScannerState::new()),
            workers: Vec::new(),
        }
    }

    /// Get a handle on the shared state
    pub fn state(&self) -> Arc<ScannerState> {
        self.state.clone()
    }

    /// Spawn the capture thread; it owns the device until shutdown
    pub fn start_capture(&mut self, mut device: Box<dyn CaptureDevice>, throttle: Duration) {
        let state = self.state.clone();
        let handle = std::thread::spawn(move || {
            capture::capture_loop(&state, device.as_mut(), throttle);
        });
        self.workers.push(handle);
        info!("capture worker started");
    }

    /// Spawn the extraction thread; it exclusively owns the pairing state
    pub fn start_extraction(
        &mut self,
        mut extractor: Extractor,
        mut pairing: Pairing,
        log: ScanLog,
        interval: Duration,
    ) {
        let state = self.state.clone();
        let handle = std::thread::spawn(move || {
            vision::extraction_loop(&state, &mut extractor, &mut pairing, &log, interval);
        });
        self.workers.push(handle);
        info!("extraction worker started");
    }

    /// Signal every worker to stop and wait for them to exit
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        info!("shutting down workers...");
        self.state.request_stop();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        info!("all workers joined");
    }
}

impl Default for ScannerApp {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScannerApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}
