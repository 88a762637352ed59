//! labelscan - Hybrid barcode + OCR label scanner
//!
//! A station camera watches parcel labels; barcodes carrying object and
//! address codes are paired and appended to a durable scan log, while OCR
//! reads the printed label text as a secondary signal for the operator.

mod app;
mod capture;
mod config;
mod display;
mod pairing;
mod shared;
mod storage;
mod vision;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::ScannerApp;
use crate::capture::replay::ReplaySource;
use crate::capture::{CaptureConfig, CaptureDevice};
use crate::config::AppConfig;
use crate::display::ConsoleDisplay;
use crate::pairing::Pairing;
use crate::storage::log::ScanLog;
use crate::vision::{BarcodeDecoder, Extractor, OcrConfig, TextRecognizer};

/// labelscan - label scanning station
#[derive(Parser, Debug)]
#[command(name = "labelscan")]
#[command(about = "Hybrid barcode + OCR label scanner for parcel putaway stations")]
struct Args {
    /// Camera device index (overrides the config file)
    #[arg(short, long)]
    camera: Option<i32>,

    /// Replay frames from a directory of images instead of opening a camera
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Scan log file (overrides the config file)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Configuration file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("labelscan starting...");

    let mut config = load_or_create_config(args.config.as_deref());
    if let Some(camera) = args.camera {
        config.capture.device_index = camera;
    }
    if let Some(log) = args.log {
        config.log.file = log;
    }

    let capture_config = config.capture.to_capture_config();
    let extractor_config = config.extraction.to_extractor_config();

    // A device that cannot be opened is fatal: report and exit before any
    // worker thread starts.
    let device = open_device(args.replay.as_deref(), &capture_config)?;

    let extractor = Extractor::new(make_decoder()?, make_recognizer(&extractor_config.ocr)?);
    let pairing = Pairing::new(config.pairing.to_pairing_config());
    let log = ScanLog::new(config.log.file.clone());
    info!("scan log: {}", log.path().display());

    let mut app = ScannerApp::new();
    app.start_capture(device, capture_config.throttle);
    app.start_extraction(extractor, pairing, log, extractor_config.interval);

    ConsoleDisplay::new().run(&app.state());

    app.shutdown();
    info!("labelscan shutdown complete");

    Ok(())
}

/// Load configuration from file or create default
fn load_or_create_config(explicit: Option<&Path>) -> AppConfig {
    if let Some(path) = explicit {
        match config::load_config(path) {
            Ok(config) => {
                info!("loaded configuration from {:?}", path);
                return config;
            }
            Err(e) => {
                warn!("could not load {:?}: {:#}; using defaults", path, e);
                return AppConfig::default();
            }
        }
    }

    if let Ok(config_dir) = storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            if let Ok(config) = config::load_config(&config_path) {
                info!("loaded configuration from {:?}", config_path);
                return config;
            }
        } else if config::save_config(&AppConfig::default(), &config_path).is_ok() {
            info!("wrote default configuration to {:?}", config_path);
        }
    }

    info!("using default configuration");
    AppConfig::default()
}

/// Pick the frame source: a replay directory when given, the camera otherwise
fn open_device(replay: Option<&Path>, config: &CaptureConfig) -> Result<Box<dyn CaptureDevice>> {
    if let Some(dir) = replay {
        return Ok(Box::new(ReplaySource::open(dir)?));
    }
    open_camera(config)
}

#[cfg(feature = "camera-opencv")]
fn open_camera(config: &CaptureConfig) -> Result<Box<dyn CaptureDevice>> {
    use anyhow::Context;

    let mut camera = capture::camera::OpenCvCamera::open(config.device_index)
        .context("could not open the camera")?;
    capture::negotiate_resolution(&mut camera, &config.resolutions);
    Ok(Box::new(camera))
}

#[cfg(not(feature = "camera-opencv"))]
fn open_camera(_config: &CaptureConfig) -> Result<Box<dyn CaptureDevice>> {
    anyhow::bail!("built without the camera-opencv feature; use --replay <dir>")
}

#[cfg(feature = "barcode-rxing")]
fn make_decoder() -> Result<Box<dyn BarcodeDecoder>> {
    Ok(Box::new(vision::barcode::RxingDecoder::new()))
}

#[cfg(not(feature = "barcode-rxing"))]
fn make_decoder() -> Result<Box<dyn BarcodeDecoder>> {
    anyhow::bail!("built without a barcode backend; enable the barcode-rxing feature")
}

#[cfg(feature = "ocr-tesseract")]
fn make_recognizer(config: &OcrConfig) -> Result<Option<Box<dyn TextRecognizer>>> {
    Ok(Some(Box::new(vision::ocr::TessRecognizer::new(config)?)))
}

#[cfg(not(feature = "ocr-tesseract"))]
fn make_recognizer(_config: &OcrConfig) -> Result<Option<Box<dyn TextRecognizer>>> {
    info!("built without the ocr-tesseract feature; text recognition disabled");
    Ok(None)
}
