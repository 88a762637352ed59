//! OpenCV camera backend
//!
//! Live capture from a V4L2/DirectShow device opened by index. The device
//! handle is released when the source is dropped, i.e. when the capture
//! thread exits.

use opencv::core::Mat;
use opencv::prelude::*;
use opencv::{imgproc, videoio};

use super::{CaptureDevice, CaptureError};
use crate::capture::frame::Frame;

/// Camera capture via `opencv::videoio::VideoCapture`
pub struct OpenCvCamera {
    capture: videoio::VideoCapture,
}

impl OpenCvCamera {
    /// Open the camera at `index` with the default backend.
    ///
    /// Failure here is fatal for the process: there is nothing to scan
    /// without a device, so no retry is attempted.
    pub fn open(index: i32) -> Result<Self, CaptureError> {
        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|_| CaptureError::DeviceOpen(index))?;

        let opened = capture
            .is_opened()
            .map_err(|_| CaptureError::DeviceOpen(index))?;
        if !opened {
            return Err(CaptureError::DeviceOpen(index));
        }

        Ok(Self { capture })
    }

    fn get_dimension(&self, prop: i32) -> u32 {
        self.capture.get(prop).map(|v| v as u32).unwrap_or(0)
    }
}

impl CaptureDevice for OpenCvCamera {
    fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), CaptureError> {
        self.capture
            .set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(width))
            .map_err(|e| CaptureError::Resolution(e.to_string()))?;
        self.capture
            .set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(height))
            .map_err(|e| CaptureError::Resolution(e.to_string()))?;
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (
            self.get_dimension(videoio::CAP_PROP_FRAME_WIDTH),
            self.get_dimension(videoio::CAP_PROP_FRAME_HEIGHT),
        )
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let mut bgr = Mat::default();
        let ok = self
            .capture
            .read(&mut bgr)
            .map_err(|e| CaptureError::Read(e.to_string()))?;
        if !ok || bgr.empty() {
            return Err(CaptureError::Read("device returned no frame".into()));
        }

        // OpenCV hands frames out as BGR; everything downstream is RGB.
        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB)
            .map_err(|e| CaptureError::Read(e.to_string()))?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb
            .data_bytes()
            .map_err(|e| CaptureError::Read(e.to_string()))?
            .to_vec();

        Ok(Frame::new(data, width, height))
    }
}
