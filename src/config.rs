//! Configuration for the scale reader.
//!
//! Loads settings from config.json at startup. Every field has a default, so a
//! missing or partial file still yields a usable configuration that behaves
//! exactly like the built-in one.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete scale reader configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// Camera device index passed to the capture backend
    #[serde(default)]
    pub camera_index: i32,
    /// Title of the live preview window
    #[serde(default = "default_window_title")]
    pub window_title: String,
    /// Key that stops the loop when pressed in the preview window
    #[serde(default = "default_quit_key")]
    pub quit_key: char,
    /// Number of successful readings that must agree before reporting
    #[serde(default = "default_stability_window")]
    pub stability_window: usize,
    /// Readings are stable when max - min is below this (same unit as the display)
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: f64,
    /// Candidate regions need width/height strictly above this
    #[serde(default = "default_min_aspect_ratio")]
    pub min_aspect_ratio: f64,
    /// Candidate regions need width/height strictly below this
    #[serde(default = "default_max_aspect_ratio")]
    pub max_aspect_ratio: f64,
    /// Gaussian blur kernel size (odd)
    #[serde(default = "default_blur_kernel")]
    pub blur_kernel: i32,
    /// Neighbourhood size for the adaptive threshold (odd)
    #[serde(default = "default_adaptive_block_size")]
    pub adaptive_block_size: i32,
    /// Constant subtracted from the adaptive threshold mean
    #[serde(default = "default_adaptive_c")]
    pub adaptive_c: f64,
    /// Tesseract page segmentation mode (7 = single text line)
    #[serde(default = "default_ocr_psm")]
    pub ocr_psm: u8,
    /// Characters Tesseract is allowed to produce
    #[serde(default = "default_ocr_whitelist")]
    pub ocr_whitelist: String,
    /// Tesseract language / traineddata name
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    /// Explicit path to the tesseract executable; searched for when unset
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,
    /// Download traineddata when no local or system copy exists
    #[serde(default = "default_download_tessdata")]
    pub download_tessdata: bool,
}

fn default_window_title() -> String {
    "Xiaomi S200 OCR".to_string()
}

fn default_quit_key() -> char {
    'q'
}

fn default_stability_window() -> usize {
    5
}

fn default_stability_threshold() -> f64 {
    0.05
}

fn default_min_aspect_ratio() -> f64 {
    2.0
}

fn default_max_aspect_ratio() -> f64 {
    8.0
}

fn default_blur_kernel() -> i32 {
    5
}

fn default_adaptive_block_size() -> i32 {
    11
}

fn default_adaptive_c() -> f64 {
    2.0
}

fn default_ocr_psm() -> u8 {
    7
}

fn default_ocr_whitelist() -> String {
    "0123456789.".to_string()
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_download_tessdata() -> bool {
    true
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            window_title: default_window_title(),
            quit_key: default_quit_key(),
            stability_window: default_stability_window(),
            stability_threshold: default_stability_threshold(),
            min_aspect_ratio: default_min_aspect_ratio(),
            max_aspect_ratio: default_max_aspect_ratio(),
            blur_kernel: default_blur_kernel(),
            adaptive_block_size: default_adaptive_block_size(),
            adaptive_c: default_adaptive_c(),
            ocr_psm: default_ocr_psm(),
            ocr_whitelist: default_ocr_whitelist(),
            ocr_language: default_ocr_language(),
            tesseract_path: None,
            download_tessdata: default_download_tessdata(),
        }
    }
}

/// Returns the config.json path next to the executable, or `./config.json`.
pub fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("config.json")))
        .unwrap_or_else(|| Path::new("config.json").to_path_buf())
}

/// Loads configuration from the given path or returns defaults.
///
/// Read and parse failures are logged and fall back to defaults; they never
/// stop the program from starting.
pub fn load_config_from(config_path: &Path) -> ScaleConfig {
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    ScaleConfig::default()
}

/// Loads configuration from config.json next to the executable.
pub fn load_config() -> ScaleConfig {
    load_config_from(&default_config_path())
}
