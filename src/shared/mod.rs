//! Shared state between the capture, extraction, and display threads
//!
//! The pipeline is coordinated exclusively through the single-value slots in
//! this module plus one process-wide running flag; there are no channels or
//! work queues between the workers.

pub mod state;

pub use state::{ScanStatus, ScannerState, Slot};
