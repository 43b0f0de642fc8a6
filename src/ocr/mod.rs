pub mod engine;
pub mod extract;
pub mod setup;

pub use engine::{DigitRecognizer, TesseractRecognizer};
pub use extract::parse_reading;
pub use setup::ensure_tesseract;

use anyhow::Result;
use opencv::core::Mat;

use crate::vision::{Roi, binarize_region, mat_to_gray_image};

/// Raw OCR text for the display region of a frame.
///
/// Crops `roi`, binarizes it with Otsu's threshold and hands the result to the
/// recognizer.
pub fn recognize_region<R: DigitRecognizer + ?Sized>(
    frame: &Mat,
    roi: Roi,
    recognizer: &R,
) -> Result<String> {
    let binary = binarize_region(frame, roi)?;
    let image = mat_to_gray_image(&binary)?;
    recognizer.recognize_digits(&image)
}

/// High-level function: frame + display region → weight.
///
/// Unparsable text is `Ok(None)`. An `Err` means the crop or the engine
/// failed; callers treat it as a miss for this frame as well.
pub fn extract_reading<R: DigitRecognizer + ?Sized>(
    frame: &Mat,
    roi: Roi,
    recognizer: &R,
) -> Result<Option<f64>> {
    let text = recognize_region(frame, roi, recognizer)?;
    Ok(parse_reading(&text))
}
