//! Image processing for locating and isolating the scale display.
//!
//! This module provides:
//! - Frame binarization for contour search (`preprocess_display`)
//! - Display region detection (`DisplayLocator`, `ContourLocator`)
//! - Region cropping and Otsu binarization for OCR (`binarize_region`)

pub mod locator;
pub mod preprocess;

pub use locator::{ContourLocator, DisplayLocator, Roi};
pub use preprocess::{PreprocessOptions, binarize_region, mat_to_gray_image, preprocess_display};
