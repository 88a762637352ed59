//! Replay capture source
//!
//! Cycles still images from a directory as if they were camera frames.
//! Used for camera-less stations, offline testing, and benchmarking the
//! extraction pipeline against recorded labels.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{CaptureDevice, CaptureError};
use crate::capture::frame::Frame;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Capture source backed by a directory of still images
pub struct ReplaySource {
    files: Vec<PathBuf>,
    next: usize,
    resolution: (u32, u32),
}

impl ReplaySource {
    /// Build a replay source from every supported image in `dir`,
    /// in lexicographic order
    pub fn open(dir: &Path) -> Result<Self, CaptureError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CaptureError::EmptyReplayDir(format!("{}: {}", dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(CaptureError::EmptyReplayDir(dir.display().to_string()));
        }

        info!("replay source: {} image(s) from {}", files.len(), dir.display());

        Ok(Self {
            files,
            next: 0,
            resolution: (0, 0),
        })
    }
}

impl CaptureDevice for ReplaySource {
    fn set_resolution(&mut self, _width: u32, _height: u32) -> Result<(), CaptureError> {
        // Replay frames keep their native size; the request is ignored and
        // negotiation falls through to the reported default.
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let path = &self.files[self.next];
        self.next = (self.next + 1) % self.files.len();

        let image = image::open(path)
            .map_err(|e| CaptureError::Read(format!("{}: {}", path.display(), e)))?
            .to_rgb8();

        let (width, height) = image.dimensions();
        self.resolution = (width, height);

        Ok(Frame::new(image.into_raw(), width, height))
    }
}
