//! Live preview window.
//!
//! Draws the located display and the latest reading on each frame and polls
//! the keyboard for the quit key.

use anyhow::Result;
use opencv::core::{Mat, Point, Rect, Scalar};
use opencv::highgui;
use opencv::imgproc;

use crate::vision::Roi;

/// Where the annotated frame goes and where the quit signal comes from.
pub trait Presenter {
    fn render(&mut self, frame: &mut Mat, roi: Option<Roi>, latest: Option<f64>) -> Result<()>;
    fn quit_requested(&mut self) -> Result<bool>;
}

/// Text drawn in the top-left corner of the preview.
pub fn overlay_text(weight: f64) -> String {
    format!("Weight: {:.2} kg", weight)
}

fn green() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

/// Draws the display rectangle and the current reading onto `frame`.
pub fn annotate_frame(frame: &mut Mat, roi: Option<Roi>, latest: Option<f64>) -> Result<()> {
    if let Some(roi) = roi {
        imgproc::rectangle(frame, Rect::from(roi), green(), 2, imgproc::LINE_8, 0)?;
    }

    if let Some(weight) = latest {
        imgproc::put_text(
            frame,
            &overlay_text(weight),
            Point::new(50, 50),
            imgproc::FONT_HERSHEY_SIMPLEX,
            1.0,
            green(),
            2,
            imgproc::LINE_8,
            false,
        )?;
    }

    Ok(())
}

/// HighGUI window. Destroyed when dropped.
pub struct PreviewWindow {
    title: String,
    quit_key: char,
}

impl PreviewWindow {
    pub fn open(title: &str, quit_key: char) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            title: title.to_string(),
            quit_key,
        })
    }
}

impl Presenter for PreviewWindow {
    fn render(&mut self, frame: &mut Mat, roi: Option<Roi>, latest: Option<f64>) -> Result<()> {
        annotate_frame(frame, roi, latest)?;
        highgui::imshow(&self.title, &*frame)?;
        Ok(())
    }

    fn quit_requested(&mut self) -> Result<bool> {
        let key = highgui::wait_key(1)?;
        Ok(is_quit_key(key, self.quit_key))
    }
}

impl Drop for PreviewWindow {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(&self.title);
    }
}

/// Compares the low byte of a HighGUI key code with the quit key.
fn is_quit_key(key: i32, quit_key: char) -> bool {
    key >= 0 && (key & 0xFF) as u32 == quit_key as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{self, CV_8UC3};
    use opencv::prelude::*;

    #[test]
    fn test_overlay_text_two_decimals() {
        assert_eq!(overlay_text(12.3), "Weight: 12.30 kg");
        assert_eq!(overlay_text(0.456), "Weight: 0.46 kg");
        assert_eq!(overlay_text(70.0), "Weight: 70.00 kg");
    }

    #[test]
    fn test_is_quit_key() {
        assert!(is_quit_key('q' as i32, 'q'));
        // Some backends set high bits for modifier state
        assert!(is_quit_key(0x10_0000 | 'q' as i32, 'q'));
        assert!(!is_quit_key('w' as i32, 'q'));
        assert!(!is_quit_key(-1, 'q'));
    }

    #[test]
    fn test_annotate_draws_only_when_data_present() {
        let mut frame =
            Mat::new_rows_cols_with_default(100, 200, CV_8UC3, Scalar::all(0.0)).unwrap();
        annotate_frame(&mut frame, None, None).unwrap();
        let mut gray = Mat::default();
        core::extract_channel(&frame, &mut gray, 1).unwrap();
        assert_eq!(core::count_non_zero(&gray).unwrap(), 0);

        annotate_frame(&mut frame, Some(Roi::new(10, 60, 80, 20)), Some(1.5)).unwrap();
        core::extract_channel(&frame, &mut gray, 1).unwrap();
        assert!(core::count_non_zero(&gray).unwrap() > 0);
        assert_eq!(frame.at_2d::<core::Vec3b>(60, 10).unwrap()[1], 255);
    }
}
