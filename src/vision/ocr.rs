//! Text recognition capability
//!
//! Like barcode decoding, recognition is a black box: binarized image in,
//! raw text out. Language and line-segmentation mode are fixed at
//! construction and never change during a run. The backend is Tesseract via
//! `leptess`, behind the `ocr-tesseract` feature.

use anyhow::Result;
use image::GrayImage;

/// Recognition settings, fixed for the whole run
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Tesseract language code
    pub language: String,
    /// Tesseract page segmentation mode; 6 = assume a uniform block of text
    pub segmentation_mode: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "por".to_string(),
            segmentation_mode: 6,
        }
    }
}

/// Text recognition backend
pub trait TextRecognizer: Send {
    /// Recognize all text in `image` and return it as one string
    fn recognize(&mut self, image: &GrayImage) -> Result<String>;
}

#[cfg(feature = "ocr-tesseract")]
pub use tesseract::TessRecognizer;

#[cfg(feature = "ocr-tesseract")]
mod tesseract {
    use super::OcrConfig;
    use anyhow::{Context, Result};
    use image::GrayImage;

    /// Tesseract-backed recognizer
    pub struct TessRecognizer {
        engine: leptess::LepTess,
    }

    impl TessRecognizer {
        /// Initialize Tesseract with the configured language and
        /// segmentation mode
        pub fn new(config: &OcrConfig) -> Result<Self> {
            let mut engine = leptess::LepTess::new(None, &config.language)
                .with_context(|| format!("tesseract init failed for language '{}'", config.language))?;
            engine
                .set_variable(
                    leptess::Variable::TesseditPagesegMode,
                    &config.segmentation_mode.to_string(),
                )
                .context("could not set tesseract segmentation mode")?;
            Ok(Self { engine })
        }
    }

    impl super::TextRecognizer for TessRecognizer {
        fn recognize(&mut self, image: &GrayImage) -> Result<String> {
            // leptess ingests encoded images; hand it a lossless PNG.
            let mut png = Vec::new();
            image::DynamicImage::ImageLuma8(image.clone())
                .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
                .context("could not encode frame for recognition")?;

            self.engine
                .set_image_from_mem(&png)
                .context("tesseract rejected the frame")?;
            self.engine
                .get_utf8_text()
                .context("tesseract recognition failed")
        }
    }
}
