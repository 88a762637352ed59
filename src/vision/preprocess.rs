//! Frame preprocessing for decoding and recognition
//!
//! Barcode decoding runs on the plain grayscale frame; text recognition gets
//! an Otsu-binarized, inverted copy (dark print on a light label comes out as
//! white-on-black, which is what the recognizer is tuned for here).

use anyhow::{Context, Result};
use image::GrayImage;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};

use crate::capture::frame::Frame;

/// Convert a captured RGB frame to a single-channel intensity image
pub fn to_gray(frame: &Frame) -> Result<GrayImage> {
    let rgb = image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
        .context("frame buffer does not match its dimensions")?;
    Ok(image::DynamicImage::ImageRgb8(rgb).to_luma8())
}

/// Binarize a grayscale image with an Otsu-picked threshold, inverted
pub fn binarize(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    threshold(gray, level, ThresholdType::BinaryInverted)
}
