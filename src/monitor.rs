//! The capture → locate → read → stabilize → present loop.
//!
//! Everything runs on the calling thread. Each iteration blocks on the next
//! frame, processes it completely and checks for the quit key once before
//! reading again.

use anyhow::Result;
use opencv::core::Mat;
use std::io::{self, Write};

use crate::capture::{Camera, FrameSource};
use crate::config::ScaleConfig;
use crate::ocr::{self, DigitRecognizer, TesseractRecognizer};
use crate::preview::{Presenter, PreviewWindow};
use crate::stabilizer::StabilizationFilter;
use crate::vision::{ContourLocator, DisplayLocator, PreprocessOptions, Roi, preprocess_display};

/// Recognition failures are logged on the first occurrence and then once per
/// this many.
const FAILURE_LOG_INTERVAL: u64 = 100;

/// Outcome of processing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// Display region, when one was found
    pub roi: Option<Roi>,
    /// Weight parsed from this frame
    pub reading: Option<f64>,
    /// Set when this frame completed a new stable reading
    pub stabilized: Option<f64>,
}

/// Formats a weight with the shortest round-trip digits.
///
/// Whole numbers keep a trailing `.0`. Magnitudes below `1e-4` or from `1e16`
/// up switch to exponent form, and the exponent always carries a sign and at
/// least two digits (`1e-05`, `1.5e+16`).
pub fn format_weight(weight: f64) -> String {
    let repr = format!("{:?}", weight);
    let Some((mantissa, exponent)) = repr.split_once('e') else {
        return repr;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{}e{}{:0>2}", mantissa, sign, digits)
}

/// Console line printed for each stabilization event.
pub fn stabilized_message(weight: f64) -> String {
    format!("Stabilized weight: {} kg", format_weight(weight))
}

/// Writes exactly one event line to `out` and records it in the log file.
pub fn report_stabilized<W: Write>(out: &mut W, weight: f64) -> io::Result<()> {
    let line = stabilized_message(weight);
    writeln!(out, "{}", line)?;
    out.flush()?;
    crate::log_to_file(&line);
    Ok(())
}

/// Per-frame pipeline state: collaborators plus the stabilization filter.
pub struct ScaleMonitor<L, R> {
    locator: L,
    recognizer: R,
    preprocess: PreprocessOptions,
    filter: StabilizationFilter,
    recognition_failures: u64,
}

impl<L: DisplayLocator, R: DigitRecognizer> ScaleMonitor<L, R> {
    pub fn new(
        locator: L,
        recognizer: R,
        preprocess: PreprocessOptions,
        filter: StabilizationFilter,
    ) -> Self {
        Self {
            locator,
            recognizer,
            preprocess,
            filter,
            recognition_failures: 0,
        }
    }

    pub fn filter(&self) -> &StabilizationFilter {
        &self.filter
    }

    pub fn recognition_failures(&self) -> u64 {
        self.recognition_failures
    }

    /// Runs one frame through the pipeline.
    ///
    /// Detection and recognition misses produce an empty reading; only
    /// preprocessing and contour search errors propagate.
    pub fn process_frame(&mut self, frame: &Mat) -> Result<FrameReport> {
        let binary = preprocess_display(frame, &self.preprocess)?;
        let roi = self.locator.locate_display(&binary)?;

        let reading = match roi {
            Some(roi) => self.read_region(frame, roi),
            None => None,
        };

        let stabilized = self.filter.push(reading);

        Ok(FrameReport {
            roi,
            reading,
            stabilized,
        })
    }

    fn read_region(&mut self, frame: &Mat, roi: Roi) -> Option<f64> {
        match ocr::extract_reading(frame, roi, &self.recognizer) {
            Ok(reading) => reading,
            Err(e) => {
                self.recognition_failures += 1;
                if self.recognition_failures % FAILURE_LOG_INTERVAL == 1 {
                    crate::log(&format!(
                        "Recognition failed ({} so far): {:#}",
                        self.recognition_failures, e
                    ));
                }
                None
            }
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The frame source stopped yielding frames
    EndOfStream,
    /// The operator pressed the quit key
    QuitRequested,
}

/// Totals for one run of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub reason: StopReason,
    pub frames: u64,
    /// Frames that produced a parsed reading
    pub readings: u64,
}

/// Drives the monitor until the source ends or the presenter asks to quit.
///
/// `on_stabilized` is called once per stabilization event.
pub fn run_loop<S, P, L, R, F>(
    source: &mut S,
    presenter: &mut P,
    monitor: &mut ScaleMonitor<L, R>,
    mut on_stabilized: F,
) -> Result<LoopSummary>
where
    S: FrameSource,
    P: Presenter,
    L: DisplayLocator,
    R: DigitRecognizer,
    F: FnMut(f64),
{
    let mut frames = 0;
    let mut readings = 0;

    let reason = loop {
        let Some(mut frame) = source.next_frame()? else {
            break StopReason::EndOfStream;
        };

        let report = monitor.process_frame(&frame)?;
        frames += 1;
        if report.reading.is_some() {
            readings += 1;
        }
        if let Some(weight) = report.stabilized {
            on_stabilized(weight);
        }

        presenter.render(&mut frame, report.roi, monitor.filter().latest())?;
        if presenter.quit_requested()? {
            break StopReason::QuitRequested;
        }
    };

    Ok(LoopSummary {
        reason,
        frames,
        readings,
    })
}

/// Builds the recognizer, falling back to a bare `tesseract` when setup fails.
fn build_recognizer(config: &ScaleConfig) -> TesseractRecognizer {
    let recognizer = match ocr::ensure_tesseract(config) {
        Ok(paths) => TesseractRecognizer::new(paths, config),
        Err(e) => {
            crate::log(&format!("Warning: Failed to setup Tesseract: {}", e));
            crate::log("OCR features may not work correctly.");
            TesseractRecognizer::fallback(config)
        }
    };
    crate::log(&format!("OCR engine: {}", recognizer.executable().display()));
    recognizer
}

/// Opens the camera and preview window and runs until quit or end of stream.
///
/// The camera and window are released on every exit path when they go out of
/// scope.
pub fn run(config: &ScaleConfig) -> Result<()> {
    // May block on a traineddata download, so it runs before the window exists.
    let recognizer = build_recognizer(config);
    let filter = StabilizationFilter::from_config(config);
    crate::log(&format!(
        "Reporting a weight once {} readings agree within {}",
        filter.capacity(),
        filter.threshold()
    ));

    let mut camera = Camera::open(config.camera_index)?;
    let mut preview = PreviewWindow::open(&config.window_title, config.quit_key)?;

    let mut monitor = ScaleMonitor::new(
        ContourLocator::from_config(config),
        recognizer,
        PreprocessOptions::from_config(config),
        filter,
    );

    crate::log(&format!(
        "Monitoring scale display (press '{}' in the preview window to quit)",
        config.quit_key
    ));

    let summary = run_loop(&mut camera, &mut preview, &mut monitor, |weight| {
        if let Err(e) = report_stabilized(&mut io::stdout().lock(), weight) {
            crate::log_to_file(&format!("Failed to print stabilized weight: {}", e));
        }
    })?;

    crate::log(&format!(
        "Monitor stopped: {:?} after {} frames ({} readings, {} recognition failures)",
        summary.reason,
        summary.frames,
        summary.readings,
        monitor.recognition_failures()
    ));
    Ok(())
}
