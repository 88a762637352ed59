//! Display Layer
//!
//! Console presenter for the operator. Strictly a reader of the shared
//! slots: it reports newly seen detections and completed pairs, and polls
//! the quit key. It never writes pipeline state other than the stop
//! request, and it may lag the freshest status (latest wins, no lockstep
//! with capture).

use std::io::BufRead;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use tracing::info;

use crate::shared::{ScanStatus, ScannerState};
use crate::vision::Detection;

/// Console presenter
pub struct ConsoleDisplay {
    keys: Receiver<()>,
    refresh: Duration,
}

impl ConsoleDisplay {
    /// Create a presenter and start its quit-key reader on stdin
    pub fn new() -> Self {
        let (tx, rx) = unbounded();

        // The reader blocks on stdin, is never joined, and holds no
        // pipeline state; it dies with the process.
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().eq_ignore_ascii_case("q") && tx.send(()).is_err() {
                    break;
                }
            }
        });

        Self::from_receiver(rx)
    }

    fn from_receiver(keys: Receiver<()>) -> Self {
        Self {
            keys,
            refresh: Duration::from_millis(50),
        }
    }

    /// Presentation loop, run on the main thread until quit is requested or
    /// the pipeline stops
    pub fn run(&self, state: &ScannerState) {
        info!("scanner running; press 'q' then Enter to quit");

        let mut saw_frame = false;
        let mut previous = ScanStatus::default();

        while state.is_running() {
            if self.keys.try_recv().is_ok() {
                info!("quit requested");
                state.request_stop();
                break;
            }

            if !saw_frame {
                if let Some(frame) = state.frame.snapshot() {
                    info!("first frame received: {}x{}", frame.width, frame.height);
                    saw_frame = true;
                }
            }

            if let Some(status) = state.status.snapshot() {
                report_changes(&previous, &status);
                previous = status;
            }

            std::thread::sleep(self.refresh);
        }
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// Report what changed between two status snapshots.
///
/// A detection identical to one in the previous snapshot is not repeated;
/// codes sitting in front of the camera would otherwise flood the console
/// every cycle.
fn report_changes(previous: &ScanStatus, current: &ScanStatus) {
    for detection in &current.detections {
        if previous.detections.contains(detection) {
            continue;
        }
        match detection {
            Detection::Barcode(code) => info!(
                "barcode read: {} at ({}, {}) {}x{}",
                code.payload, code.region.x, code.region.y, code.region.width, code.region.height
            ),
            Detection::ObjectText(id) => info!("ocr object: {}", id),
            Detection::AddressText(address) => info!(
                "ocr address: city {} district {} street {} building {} level {} unit {}",
                address.city,
                address.district,
                address.street,
                address.building,
                address.level,
                address.unit
            ),
        }
    }

    if current.pairs_completed > previous.pairs_completed {
        if let Some(pair) = &current.last_pair {
            info!("pair completed: {} / {}", pair.object, pair.address);
        }
    }
}
