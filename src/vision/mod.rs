//! Extraction Layer
//!
//! Pulls the newest frame off the shared slot on a fixed cadence, runs the
//! barcode and text-recognition capabilities over it, applies the label
//! patterns, feeds the pairing machine, and publishes the cycle's detection
//! set for the display.
//!
//! Both capabilities are black boxes behind traits; a backend error inside a
//! cycle downgrades that capability's contribution to "no detections" and
//! the loop carries on at its normal cadence.

pub mod barcode;
pub mod ocr;
pub mod patterns;
pub mod preprocess;

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::capture::frame::Frame;
use crate::pairing::Pairing;
use crate::shared::{ScanStatus, ScannerState};
use crate::storage::log::ScanLog;

pub use barcode::{BarcodeDecoder, DecodedCode, Region};
pub use ocr::{OcrConfig, TextRecognizer};
pub use patterns::AddressText;

/// One structured result extracted from a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// A decoded barcode with its payload and bounding region
    Barcode(DecodedCode),
    /// Object identifier recognized from printed text (debug/display signal)
    ObjectText(String),
    /// Address fields recognized from printed text (debug/display signal)
    AddressText(AddressText),
}

/// The full detection set of one extraction cycle
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    /// Everything found in the frame, barcodes first
    pub detections: Vec<Detection>,
    /// Time spent extracting, in milliseconds
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Payloads of the cycle's barcode detections, in decode order
    pub fn barcode_payloads(&self) -> Vec<&str> {
        self.detections
            .iter()
            .filter_map(|detection| match detection {
                Detection::Barcode(code) => Some(code.payload.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Extraction configuration
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Fixed sleep between extraction cycles
    pub interval: Duration,
    /// Recognition settings handed to the OCR backend
    pub ocr: OcrConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(80),
            ocr: OcrConfig::default(),
        }
    }
}

/// Per-frame extraction pipeline: grayscale, decode, recognize, pattern scan
pub struct Extractor {
    decoder: Box<dyn BarcodeDecoder>,
    recognizer: Option<Box<dyn TextRecognizer>>,
}

impl Extractor {
    /// Build an extractor from a decoder and an optional recognizer.
    ///
    /// Without a recognizer the text patterns are never applied; barcode
    /// extraction (and with it the whole pairing contract) is unaffected.
    pub fn new(decoder: Box<dyn BarcodeDecoder>, recognizer: Option<Box<dyn TextRecognizer>>) -> Self {
        Self { decoder, recognizer }
    }

    /// Run one extraction cycle over a frame snapshot
    pub fn extract(&mut self, frame: &Frame) -> ExtractionResult {
        let start = Instant::now();
        let mut detections = Vec::new();

        let gray = match preprocess::to_gray(frame) {
            Ok(gray) => gray,
            Err(e) => {
                warn!("frame conversion failed: {:#}", e);
                return ExtractionResult::default();
            }
        };

        match self.decoder.decode(&gray) {
            Ok(codes) => detections.extend(codes.into_iter().map(Detection::Barcode)),
            Err(e) => warn!("barcode decode failed: {:#}", e),
        }

        if let Some(recognizer) = self.recognizer.as_deref_mut() {
            let binary = preprocess::binarize(&gray);
            match recognizer.recognize(&binary) {
                Ok(text) => {
                    if let Some(id) = patterns::find_object_id(&text) {
                        detections.push(Detection::ObjectText(id));
                    }
                    if let Some(address) = patterns::find_address(&text) {
                        detections.push(Detection::AddressText(address));
                    }
                }
                Err(e) => warn!("text recognition failed: {:#}", e),
            }
        }

        let processing_time = start.elapsed();
        debug!(
            "extraction cycle complete in {:?}: {} detection(s)",
            processing_time,
            detections.len()
        );

        ExtractionResult {
            detections,
            processing_time_ms: processing_time.as_millis() as u64,
        }
    }
}

/// Extraction loop, run on its own thread at a bounded cadence.
///
/// Each cycle snapshots the newest frame (skipping the cycle if none has
/// arrived yet), extracts, folds the barcode payloads into the pairing
/// machine, appends any completed pair to the scan log, and publishes the
/// cycle's status. A failed append is reported and the pair is consumed
/// anyway; the pairing state never rolls back.
pub fn extraction_loop(
    state: &ScannerState,
    extractor: &mut Extractor,
    pairing: &mut Pairing,
    log: &ScanLog,
    interval: Duration,
) {
    info!("extraction loop started");

    let mut pairs_completed = 0u64;
    let mut last_pair = None;

    while state.is_running() {
        std::thread::sleep(interval);

        let Some(frame) = state.frame.snapshot() else {
            continue;
        };

        let result = extractor.extract(&frame);
        let completed = pairing.apply_cycle(result.barcode_payloads(), Instant::now());

        if let Some(pair) = completed {
            pairs_completed += 1;
            match log.append(&pair) {
                Ok(entry) => info!(
                    "pair logged: {} / {} at {}",
                    entry.object, entry.address, entry.timestamp
                ),
                Err(e) => error!("log append failed, pair dropped: {:#}", e),
            }
            last_pair = Some(pair);
        }

        let now = Instant::now();
        state.status.publish(ScanStatus {
            detections: result.detections,
            held_object: pairing.held_object().map(String::from),
            held_address: pairing.held_address().map(String::from),
            cooldown_active: pairing.in_cooldown(now),
            pairs_completed,
            last_pair: last_pair.clone(),
            processing_time_ms: result.processing_time_ms,
        });
    }

    info!("extraction loop exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::PairingConfig;
    use anyhow::anyhow;
    use image::GrayImage;
    use std::sync::Arc;

    struct FakeDecoder {
        codes: Vec<DecodedCode>,
        fail: bool,
    }

    impl FakeDecoder {
        fn with_payloads(payloads: &[&str]) -> Self {
            Self {
                codes: payloads
                    .iter()
                    .map(|p| DecodedCode {
                        payload: p.to_string(),
                        region: Region::default(),
                    })
                    .collect(),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                codes: vec![],
                fail: true,
            }
        }
    }

    impl BarcodeDecoder for FakeDecoder {
        fn decode(&mut self, _image: &GrayImage) -> anyhow::Result<Vec<DecodedCode>> {
            if self.fail {
                return Err(anyhow!("decoder exploded"));
            }
            Ok(self.codes.clone())
        }
    }

    struct FakeRecognizer {
        text: String,
        fail: bool,
    }

    impl TextRecognizer for FakeRecognizer {
        fn recognize(&mut self, _image: &GrayImage) -> anyhow::Result<String> {
            if self.fail {
                return Err(anyhow!("recognizer exploded"));
            }
            Ok(self.text.clone())
        }
    }

    fn test_frame() -> Frame {
        Frame::new(vec![200u8; 8 * 8 * 3], 8, 8)
    }

    #[test]
    fn test_extract_collects_barcodes() {
        let mut extractor = Extractor::new(
            Box::new(FakeDecoder::with_payloads(&["OBJ;12345678"])),
            None,
        );
        let result = extractor.extract(&test_frame());
        assert_eq!(result.barcode_payloads(), vec!["OBJ;12345678"]);
    }

    #[test]
    fn test_extract_applies_text_patterns() {
        let recognizer = FakeRecognizer {
            text: "Objeto: 12345678\n001 002 003 004 005 006".to_string(),
            fail: false,
        };
        let mut extractor = Extractor::new(
            Box::new(FakeDecoder::with_payloads(&[])),
            Some(Box::new(recognizer)),
        );

        let result = extractor.extract(&test_frame());
        assert!(result
            .detections
            .iter()
            .any(|d| matches!(d, Detection::ObjectText(id) if id == "12345678")));
        assert!(result
            .detections
            .iter()
            .any(|d| matches!(d, Detection::AddressText(a) if a.city == "001" && a.unit == "006")));
    }

    #[test]
    fn test_decoder_failure_yields_empty_cycle() {
        let mut extractor = Extractor::new(Box::new(FakeDecoder::failing()), None);
        let result = extractor.extract(&test_frame());
        assert!(result.detections.is_empty());
    }

    #[test]
    fn test_recognizer_failure_keeps_barcodes() {
        let recognizer = FakeRecognizer {
            text: String::new(),
            fail: true,
        };
        let mut extractor = Extractor::new(
            Box::new(FakeDecoder::with_payloads(&["OBJ;A"])),
            Some(Box::new(recognizer)),
        );

        let result = extractor.extract(&test_frame());
        assert_eq!(result.barcode_payloads(), vec!["OBJ;A"]);
    }

    #[test]
    fn test_loop_pairs_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log.csv");
        let log = ScanLog::new(log_path.clone());

        let state = Arc::new(ScannerState::new());
        state.frame.publish(test_frame());

        let mut extractor = Extractor::new(
            Box::new(FakeDecoder::with_payloads(&[
                "OBJ;12345678",
                "APT;001 002 003 004 005 006",
            ])),
            None,
        );
        let mut pairing = Pairing::new(PairingConfig {
            cooldown: Duration::from_secs(60),
        });

        let loop_state = state.clone();
        let handle = std::thread::spawn(move || {
            extraction_loop(
                &loop_state,
                &mut extractor,
                &mut pairing,
                &log,
                Duration::from_millis(5),
            );
        });

        std::thread::sleep(Duration::from_millis(100));
        state.request_stop();
        handle.join().unwrap();

        // The same codes stayed "in view" every cycle; the cooldown plus the
        // differs-check mean exactly one pair may be logged.
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents.lines().count(), 2, "header + one data row");

        let status = state.status.snapshot().expect("status was published");
        assert_eq!(status.pairs_completed, 1);
        assert_eq!(
            status.last_pair.as_ref().map(|p| p.object.as_str()),
            Some("OBJ;12345678")
        );
    }
}
