//! Application Configuration
//!
//! Station settings stored in TOML format. CLI flags override the file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::CaptureConfig;
use crate::pairing::PairingConfig;
use crate::vision::{ExtractorConfig, OcrConfig};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Capture settings
    pub capture: CaptureSettings,
    /// Extraction settings
    pub extraction: ExtractionSettings,
    /// Pairing settings
    pub pairing: PairingSettings,
    /// Scan log settings
    pub log: LogSettings,
}

/// Capture-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Camera device index
    pub device_index: i32,
    /// Resolutions to request, in priority order
    pub resolutions: Vec<(u32, u32)>,
    /// Sleep between frame reads in milliseconds (sub-20ms)
    pub throttle_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolutions: vec![(1920, 1080), (1280, 720)],
            throttle_ms: 5,
        }
    }
}

impl CaptureSettings {
    pub fn to_capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            device_index: self.device_index,
            resolutions: self.resolutions.clone(),
            throttle: Duration::from_millis(self.throttle_ms),
        }
    }
}

/// Extraction-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Sleep between extraction cycles in milliseconds
    pub interval_ms: u64,
    /// OCR language code
    pub ocr_language: String,
    /// OCR page segmentation mode
    pub ocr_segmentation_mode: u32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            interval_ms: 80,
            ocr_language: "por".to_string(),
            ocr_segmentation_mode: 6,
        }
    }
}

impl ExtractionSettings {
    pub fn to_extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            interval: Duration::from_millis(self.interval_ms),
            ocr: OcrConfig {
                language: self.ocr_language.clone(),
                segmentation_mode: self.ocr_segmentation_mode,
            },
        }
    }
}

/// Pairing-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingSettings {
    /// Cooldown after a completed pair in milliseconds
    pub cooldown_ms: u64,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self { cooldown_ms: 3000 }
    }
}

impl PairingSettings {
    pub fn to_pairing_config(&self) -> PairingConfig {
        PairingConfig {
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}

/// Scan log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Scan log file, relative to the working directory unless absolute
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from("log_leituras.csv"),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.capture.device_index, 0);
        assert_eq!(config.capture.resolutions, vec![(1920, 1080), (1280, 720)]);
        assert_eq!(config.capture.throttle_ms, 5);

        assert_eq!(config.extraction.interval_ms, 80);
        assert_eq!(config.extraction.ocr_language, "por");
        assert_eq!(config.extraction.ocr_segmentation_mode, 6);

        assert_eq!(config.pairing.cooldown_ms, 3000);
        assert_eq!(config.log.file, PathBuf::from("log_leituras.csv"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.capture.resolutions, config.capture.resolutions);
        assert_eq!(parsed.extraction.interval_ms, config.extraction.interval_ms);
        assert_eq!(parsed.pairing.cooldown_ms, config.pairing.cooldown_ms);
        assert_eq!(parsed.log.file, config.log.file);
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.capture.device_index = 2;
        config.extraction.interval_ms = 50;
        config.pairing.cooldown_ms = 5000;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.capture.device_index, 2);
        assert_eq!(parsed.extraction.interval_ms, 50);
        assert_eq!(parsed.pairing.cooldown_ms, 5000);
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(loaded.extraction.ocr_language, config.extraction.ocr_language);
        assert_eq!(loaded.capture.throttle_ms, config.capture.throttle_ms);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_duration_conversions() {
        let config = AppConfig::default();
        assert_eq!(
            config.capture.to_capture_config().throttle,
            Duration::from_millis(5)
        );
        assert_eq!(
            config.extraction.to_extractor_config().interval,
            Duration::from_millis(80)
        );
        assert_eq!(
            config.pairing.to_pairing_config().cooldown,
            Duration::from_millis(3000)
        );
    }
}
