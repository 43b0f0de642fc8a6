use anyhow::{Context, Result, anyhow};
use image::{GrayImage, ImageBuffer};
use opencv::core::{self, AlgorithmHint, Mat, Rect, Size};
use opencv::imgproc;
use opencv::prelude::*;

use super::locator::Roi;
use crate::config::ScaleConfig;

/// Parameters for turning a camera frame into a binary edge map.
#[derive(Clone, Copy, Debug)]
pub struct PreprocessOptions {
    /// Gaussian kernel size; forced odd and at least 1.
    pub blur_kernel: i32,
    /// Adaptive threshold neighbourhood; forced odd and at least 3.
    pub block_size: i32,
    /// Constant subtracted from the weighted neighbourhood mean.
    pub c: f64,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            block_size: 11,
            c: 2.0,
        }
    }
}

impl PreprocessOptions {
    pub fn from_config(config: &ScaleConfig) -> Self {
        Self {
            blur_kernel: config.blur_kernel,
            block_size: config.adaptive_block_size,
            c: config.adaptive_c,
        }
    }
}

/// Converts a BGR frame to an inverted binary image suitable for contour search.
///
/// Grayscale, then Gaussian blur, then adaptive Gaussian threshold with
/// `THRESH_BINARY_INV`, so dark display outlines become white foreground.
pub fn preprocess_display(frame: &Mat, options: &PreprocessOptions) -> Result<Mat> {
    let gray = to_gray(frame)?;

    let kernel = options.blur_kernel.max(1) | 1;
    let mut blurred = Mat::default();
    imgproc::gaussian_blur(
        &gray,
        &mut blurred,
        Size::new(kernel, kernel),
        0.0,
        0.0,
        core::BORDER_DEFAULT,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;

    let block_size = options.block_size.max(3) | 1;
    let mut binary = Mat::default();
    imgproc::adaptive_threshold(
        &blurred,
        &mut binary,
        255.0,
        imgproc::ADAPTIVE_THRESH_GAUSSIAN_C,
        imgproc::THRESH_BINARY_INV,
        block_size,
        options.c,
    )?;
    Ok(binary)
}

/// Crops `roi` out of the frame and binarizes it with Otsu's global threshold.
pub fn binarize_region(frame: &Mat, roi: Roi) -> Result<Mat> {
    let roi = roi
        .clamp_to(frame.cols(), frame.rows())
        .ok_or_else(|| anyhow!("region {:?} lies outside the frame", roi))?;
    let cropped = Mat::roi(frame, Rect::from(roi))?.try_clone()?;
    let gray = to_gray(&cropped)?;

    let mut binary = Mat::default();
    imgproc::threshold(
        &gray,
        &mut binary,
        0.0,
        255.0,
        imgproc::THRESH_BINARY | imgproc::THRESH_OTSU,
    )?;
    Ok(binary)
}

/// Copies a single-channel 8-bit `Mat` into an `image` buffer.
pub fn mat_to_gray_image(mat: &Mat) -> Result<GrayImage> {
    if mat.typ() != core::CV_8UC1 {
        return Err(anyhow!("expected CV_8UC1 image, got type {}", mat.typ()));
    }
    let continuous;
    let source = if mat.is_continuous() {
        mat
    } else {
        continuous = mat.try_clone()?;
        &continuous
    };

    let width = source.cols() as u32;
    let height = source.rows() as u32;
    let bytes = source.data_bytes()?.to_vec();
    ImageBuffer::from_raw(width, height, bytes)
        .context("pixel buffer does not match image dimensions")
}

fn to_gray(frame: &Mat) -> Result<Mat> {
    if frame.channels() == 1 {
        return Ok(frame.try_clone()?);
    }
    let code = if frame.channels() == 4 {
        imgproc::COLOR_BGRA2GRAY
    } else {
        imgproc::COLOR_BGR2GRAY
    };
    let mut gray = Mat::default();
    imgproc::cvt_color(
        frame,
        &mut gray,
        code,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;
    Ok(gray)
}
