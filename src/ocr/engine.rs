use anyhow::{Result, anyhow};
use image::GrayImage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;
use crate::config::ScaleConfig;

/// Turns a binarized display image into raw text.
pub trait DigitRecognizer {
    fn recognize_digits(&self, image: &GrayImage) -> Result<String>;
}

/// Runs the Tesseract executable as a single-line digit reader.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    language: String,
    psm: u8,
    whitelist: String,
}

impl TesseractRecognizer {
    pub fn new(paths: TesseractPaths, config: &ScaleConfig) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
            language: config.ocr_language.clone(),
            psm: config.ocr_psm,
            whitelist: config.ocr_whitelist.clone(),
        }
    }

    /// Uses whatever `tesseract` resolves to on PATH with its default data.
    pub fn fallback(config: &ScaleConfig) -> Self {
        Self::new(
            TesseractPaths {
                executable: PathBuf::from("tesseract"),
                tessdata: None,
            },
            config,
        )
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Command-line arguments for reading `input` and writing text to stdout.
    fn build_args(&self, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![input.into(), "stdout".into()];
        if let Some(tessdata) = &self.tessdata {
            args.push("--tessdata-dir".into());
            args.push(tessdata.into());
        }
        args.push("-l".into());
        args.push(self.language.as_str().into());
        args.push("--psm".into());
        args.push(self.psm.to_string().into());
        args.push("-c".into());
        args.push(format!("tessedit_char_whitelist={}", self.whitelist).into());
        args
    }
}

impl DigitRecognizer for TesseractRecognizer {
    fn recognize_digits(&self, image: &GrayImage) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        image.save(temp_input.path())?;

        let output = Command::new(&self.executable)
            .args(self.build_args(temp_input.path()))
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn recognizer(tessdata: Option<&str>) -> TesseractRecognizer {
        TesseractRecognizer::new(
            TesseractPaths {
                executable: PathBuf::from("tesseract"),
                tessdata: tessdata.map(PathBuf::from),
            },
            &ScaleConfig::default(),
        )
    }

    #[test]
    fn test_args_single_line_digit_whitelist() {
        let args = recognizer(None).build_args(Path::new("in.png"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "in.png",
                "stdout",
                "-l",
                "eng",
                "--psm",
                "7",
                "-c",
                "tessedit_char_whitelist=0123456789.",
            ]
        );
    }

    #[test]
    fn test_args_include_tessdata_dir() {
        let args = recognizer(Some("/data/tessdata")).build_args(Path::new("in.png"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[2], "--tessdata-dir");
        assert_eq!(args[3], "/data/tessdata");
    }

    #[test]
    fn test_fallback_uses_bare_command() {
        let r = TesseractRecognizer::fallback(&ScaleConfig::default());
        assert_eq!(r.executable(), Path::new("tesseract"));
    }

    #[test]
    fn test_missing_executable_is_an_error() {
        let r = TesseractRecognizer::new(
            TesseractPaths {
                executable: PathBuf::from("/nonexistent/tesseract-binary"),
                tessdata: None,
            },
            &ScaleConfig::default(),
        );
        let img = GrayImage::from_pixel(8, 4, Luma([255]));
        assert!(r.recognize_digits(&img).is_err());
    }

    #[test]
    #[ignore = "requires a local Tesseract installation"]
    fn test_blank_image_yields_no_digits() {
        let r = TesseractRecognizer::fallback(&ScaleConfig::default());
        let img = GrayImage::from_pixel(120, 40, Luma([255]));
        let text = r.recognize_digits(&img).expect("tesseract should run");
        assert!(text.trim().is_empty());
    }
}
