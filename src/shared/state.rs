//! Latest-wins slots and the scanner's shared runtime state

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::capture::frame::Frame;
use crate::pairing::CompletedPair;
use crate::vision::Detection;

/// Single-value, lock-protected holder.
///
/// Each publish replaces the previous value; readers get a snapshot copy.
/// Deliberately not a queue: stale data is dropped, never delivered late.
/// Callers only ever copy a value in or out under the lock, so the lock's
/// held duration stays bounded regardless of how slow a producer or
/// consumer cycle is.
#[derive(Debug, Default)]
pub struct Slot<T> {
    value: Mutex<Option<T>>,
}

impl<T: Clone> Slot<T> {
    /// Create an empty slot
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    /// Replace the slot's value, discarding any previous one
    pub fn publish(&self, value: T) {
        *self.value.lock() = Some(value);
    }

    /// Clone the current value out, if any
    pub fn snapshot(&self) -> Option<T> {
        self.value.lock().clone()
    }
}

/// Snapshot of the extraction and pairing state, published once per
/// extraction cycle for the display to read
#[derive(Debug, Clone, Default)]
pub struct ScanStatus {
    /// The cycle's full detection set
    pub detections: Vec<Detection>,
    /// Object code currently held by the pairing machine
    pub held_object: Option<String>,
    /// Address code currently held by the pairing machine
    pub held_address: Option<String>,
    /// Whether the post-pair cooldown window is active
    pub cooldown_active: bool,
    /// Number of pairs completed since startup
    pub pairs_completed: u64,
    /// The most recently completed pair
    pub last_pair: Option<CompletedPair>,
    /// Time spent in the extraction cycle, in milliseconds
    pub processing_time_ms: u64,
}

/// Central shared state, constructed before any worker thread spawns and
/// handed to each by `Arc`
#[derive(Debug)]
pub struct ScannerState {
    /// Newest captured frame
    pub frame: Slot<Frame>,
    /// Newest extraction/pairing status
    pub status: Slot<ScanStatus>,
    running: AtomicBool,
}

impl ScannerState {
    /// Create shared state with the running flag set
    pub fn new() -> Self {
        Self {
            frame: Slot::new(),
            status: Slot::new(),
            running: AtomicBool::new(true),
        }
    }

    /// Whether the worker loops should keep running.
    /// Polled at the top of every loop iteration.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask every worker loop to exit within one iteration
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_starts_empty() {
        let slot: Slot<u32> = Slot::new();
        assert_eq!(slot.snapshot(), None);
    }

    #[test]
    fn test_slot_latest_wins() {
        let slot = Slot::new();
        slot.publish(1u32);
        slot.publish(2u32);
        assert_eq!(slot.snapshot(), Some(2));
    }

    #[test]
    fn test_snapshot_does_not_consume() {
        let slot = Slot::new();
        slot.publish("frame".to_string());
        assert_eq!(slot.snapshot().as_deref(), Some("frame"));
        assert_eq!(slot.snapshot().as_deref(), Some("frame"));
    }

    #[test]
    fn test_running_flag_round_trip() {
        let state = ScannerState::new();
        assert!(state.is_running());
        state.request_stop();
        assert!(!state.is_running());
    }
}
