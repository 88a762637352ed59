//! Barcode decoding capability
//!
//! The decoder is a black box to the rest of the pipeline: grayscale image
//! in, payloads with bounding regions out. The default backend is the
//! pure-Rust `rxing` port of ZXing.

use anyhow::Result;
use image::GrayImage;

/// Axis-aligned bounding region of a decoded barcode, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One decoded barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCode {
    /// Decoded payload as UTF-8 text
    pub payload: String,
    /// Where in the frame the code was found
    pub region: Region,
}

/// Barcode decoding backend
pub trait BarcodeDecoder: Send {
    /// Decode every barcode visible in `image`.
    ///
    /// "Nothing found" is an empty vec, not an error; errors mean the
    /// backend itself failed and the cycle should be treated as empty.
    fn decode(&mut self, image: &GrayImage) -> Result<Vec<DecodedCode>>;
}

#[cfg(feature = "barcode-rxing")]
pub use rxing_decoder::RxingDecoder;

#[cfg(feature = "barcode-rxing")]
mod rxing_decoder {
    use super::{DecodedCode, Region};
    use anyhow::Result;
    use image::GrayImage;
    use tracing::trace;

    /// Multi-format decoder backed by `rxing`
    #[derive(Debug, Default)]
    pub struct RxingDecoder;

    impl RxingDecoder {
        pub fn new() -> Self {
            Self
        }
    }

    impl super::BarcodeDecoder for RxingDecoder {
        fn decode(&mut self, image: &GrayImage) -> Result<Vec<DecodedCode>> {
            let (width, height) = image.dimensions();
            if width == 0 || height == 0 {
                return Ok(vec![]);
            }

            let results =
                match rxing::helpers::detect_multiple_in_luma(image.as_raw().clone(), width, height)
                {
                    Ok(results) => results,
                    // The multi reader reports a frame with no codes as an
                    // error; either way this cycle contributes nothing.
                    Err(e) => {
                        trace!("no barcodes decoded: {}", e);
                        return Ok(vec![]);
                    }
                };

            Ok(results
                .into_iter()
                .map(|result| {
                    let mut region = Region::default();
                    let points = result.getRXingResultPoints();
                    if !points.is_empty() {
                        let mut min_x = f32::INFINITY;
                        let mut min_y = f32::INFINITY;
                        let mut max_x = f32::NEG_INFINITY;
                        let mut max_y = f32::NEG_INFINITY;
                        for point in points {
                            min_x = min_x.min(point.x);
                            min_y = min_y.min(point.y);
                            max_x = max_x.max(point.x);
                            max_y = max_y.max(point.y);
                        }
                        region = clamped_region(min_x, min_y, max_x, max_y, width, height);
                    }

                    DecodedCode {
                        payload: result.getText().to_string(),
                        region,
                    }
                })
                .collect())
        }
    }

    /// Bounding box from min/max corners, clamped to the image
    fn clamped_region(min_x: f32, min_y: f32, max_x: f32, max_y: f32, width: u32, height: u32) -> Region {
        let x = (min_x.max(0.0) as u32).min(width);
        let y = (min_y.max(0.0) as u32).min(height);
        Region {
            x,
            y,
            width: (max_x.max(0.0) as u32).min(width).saturating_sub(x),
            height: (max_y.max(0.0) as u32).min(height).saturating_sub(y),
        }
    }
}
