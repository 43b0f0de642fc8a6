//! Display region detection.
//!
//! Finds the scale's display as the largest wide rectangle among the external
//! contours of a binarized frame.

use anyhow::Result;
use opencv::core::{self, Mat, Point, Rect};
use opencv::imgproc;

use crate::config::ScaleConfig;

/// A region of interest in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Roi {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Width over height, or `None` for degenerate rectangles.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height <= 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }

    /// Intersects the region with a `frame_width` x `frame_height` image.
    /// Returns `None` when nothing of the region lies inside the frame.
    pub fn clamp_to(&self, frame_width: i32, frame_height: i32) -> Option<Roi> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width).min(frame_width);
        let y1 = (self.y + self.height).min(frame_height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Roi::new(x0, y0, x1 - x0, y1 - y0))
    }
}

impl From<Rect> for Roi {
    fn from(rect: Rect) -> Self {
        Roi::new(rect.x, rect.y, rect.width, rect.height)
    }
}

impl From<Roi> for Rect {
    fn from(roi: Roi) -> Self {
        Rect::new(roi.x, roi.y, roi.width, roi.height)
    }
}

/// Finds the rectangle most likely to contain a numeric display.
pub trait DisplayLocator {
    /// `image` is the binarized frame produced by `preprocess_display`.
    fn locate_display(&self, image: &Mat) -> Result<Option<Roi>>;
}

/// Picks the largest candidate whose aspect ratio lies strictly inside
/// `(min_aspect, max_aspect)`.
///
/// Only a strictly larger area replaces the current best, so among equal areas
/// the first candidate wins and zero-area candidates never qualify.
pub fn select_display_roi<I>(candidates: I, min_aspect: f64, max_aspect: f64) -> Option<Roi>
where
    I: IntoIterator<Item = Roi>,
{
    let mut best = None;
    let mut max_area = 0;

    for roi in candidates {
        let Some(ratio) = roi.aspect_ratio() else {
            continue;
        };
        let area = roi.area();
        if area > max_area && min_aspect < ratio && ratio < max_aspect {
            max_area = area;
            best = Some(roi);
        }
    }

    best
}

/// Contour-based locator backed by OpenCV.
#[derive(Clone, Copy, Debug)]
pub struct ContourLocator {
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
}

impl ContourLocator {
    pub fn new(min_aspect_ratio: f64, max_aspect_ratio: f64) -> Self {
        Self {
            min_aspect_ratio,
            max_aspect_ratio,
        }
    }

    pub fn from_config(config: &ScaleConfig) -> Self {
        Self::new(config.min_aspect_ratio, config.max_aspect_ratio)
    }
}

impl DisplayLocator for ContourLocator {
    fn locate_display(&self, image: &Mat) -> Result<Option<Roi>> {
        let mut contours = core::Vector::<core::Vector<Point>>::new();
        imgproc::find_contours(
            image,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;

        let mut candidates = Vec::with_capacity(contours.len());
        for contour in contours.iter() {
            candidates.push(Roi::from(imgproc::bounding_rect(&contour)?));
        }

        Ok(select_display_roi(
            candidates,
            self.min_aspect_ratio,
            self.max_aspect_ratio,
        ))
    }
}
