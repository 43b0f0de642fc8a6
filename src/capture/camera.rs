//! Webcam capture through OpenCV's video I/O.

use anyhow::{Context, Result, bail};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use super::FrameSource;

/// An open camera device. Released when dropped.
pub struct Camera {
    capture: VideoCapture,
    device_index: i32,
}

impl Camera {
    /// Opens camera `device_index`. Failing to open is fatal for the caller.
    pub fn open(device_index: i32) -> Result<Self> {
        let capture = VideoCapture::new(device_index, videoio::CAP_ANY)
            .with_context(|| format!("Cannot open webcam {}", device_index))?;

        if !capture.is_opened()? {
            bail!("Cannot open webcam {}", device_index);
        }

        crate::log(&format!("Camera {} opened", device_index));
        Ok(Self {
            capture,
            device_index,
        })
    }
}

impl FrameSource for Camera {
    /// A failed or empty read ends the stream rather than erroring.
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        match self.capture.read(&mut frame) {
            Ok(true) if !frame.empty() => Ok(Some(frame)),
            Ok(_) => {
                crate::log("Camera returned no frame, stopping");
                Ok(None)
            }
            Err(e) => {
                crate::log(&format!("Camera read failed: {}, stopping", e));
                Ok(None)
            }
        }
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            crate::log(&format!("Failed to release camera {}: {}", self.device_index, e));
        } else {
            crate::log(&format!("Camera {} released", self.device_index));
        }
    }
}
