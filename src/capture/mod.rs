//! Frame acquisition.
//!
//! This module provides:
//! - The `FrameSource` abstraction the monitor loop reads from
//! - Webcam capture (`Camera`)

pub mod camera;

pub use camera::Camera;

use anyhow::Result;
use opencv::core::Mat;

/// Yields successive frames until the stream ends.
pub trait FrameSource {
    /// `Ok(None)` marks the end of the stream.
    fn next_frame(&mut self) -> Result<Option<Mat>>;
}
