use anyhow::{Result, anyhow};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::ScaleConfig;
use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

const COMMON_EXECUTABLE_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

const SYSTEM_TESSDATA_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets Tesseract fall back to its compiled-in data path.
    pub tessdata: Option<PathBuf>,
}

/// Returns the directory for storing Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scale-ocr")
        .join("tesseract")
}

fn executable_name() -> &'static str {
    if cfg!(windows) {
        "tesseract.exe"
    } else {
        "tesseract"
    }
}

fn traineddata_name(language: &str) -> String {
    format!("{}.traineddata", language)
}

/// Ensures Tesseract and its language data are available.
///
/// The executable must already be installed; traineddata is downloaded into
/// the local data directory when no copy can be found and downloads are
/// enabled in the config.
pub fn ensure_tesseract(config: &ScaleConfig) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
    log(&format!("Tesseract found at: {}", executable.display()));

    if let Some(tessdata) = find_tessdata_dir(&config.ocr_language) {
        log(&format!("Using tessdata at: {}", tessdata.display()));
        return Ok(TesseractPaths {
            executable,
            tessdata: Some(tessdata),
        });
    }

    if !config.download_tessdata {
        log("No tessdata directory found; relying on Tesseract defaults.");
        return Ok(TesseractPaths {
            executable,
            tessdata: None,
        });
    }

    log(&format!(
        "{} not found locally, downloading...",
        traineddata_name(&config.ocr_language)
    ));

    let tessdata_dir = get_tesseract_dir().join("tessdata");
    fs::create_dir_all(&tessdata_dir)?;
    download_tessdata(&tessdata_dir, &config.ocr_language)?;

    log(&format!("Tessdata ready at: {}", tessdata_dir.display()));

    Ok(TesseractPaths {
        executable,
        tessdata: Some(tessdata_dir),
    })
}

/// Downloads trained data for `language` from the tessdata repository.
fn download_tessdata(tessdata_dir: &Path, language: &str) -> Result<()> {
    let file_name = traineddata_name(language);
    let url = format!("{}/{}", TESSDATA_REPO, file_name);
    let target = tessdata_dir.join(&file_name);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "scale-ocr")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            file_name,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&target)?;
    file.write_all(&bytes)?;

    log(&format!("Downloaded {} ({} bytes)", file_name, bytes.len()));

    Ok(())
}

/// Finds the Tesseract executable: configured path, local dir, PATH, then
/// common install locations.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        log(&format!(
            "Configured tesseract_path {} does not exist, searching instead",
            path.display()
        ));
    }

    let local_exe = get_tesseract_dir().join(executable_name());
    if local_exe.exists() {
        return Ok(local_exe);
    }

    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for path in COMMON_EXECUTABLE_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory containing `<language>.traineddata`.
pub fn find_tessdata_dir(language: &str) -> Option<PathBuf> {
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }

    candidates.extend(SYSTEM_TESSDATA_PATHS.iter().map(PathBuf::from));

    first_dir_with_traineddata(candidates, language)
}

fn first_dir_with_traineddata(candidates: Vec<PathBuf>, language: &str) -> Option<PathBuf> {
    let file_name = traineddata_name(language);
    candidates
        .into_iter()
        .find(|dir| dir.join(&file_name).exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_traineddata_name() {
        assert_eq!(traineddata_name("eng"), "eng.traineddata");
    }

    #[test]
    fn test_first_dir_with_traineddata_skips_empty_dirs() {
        let empty = tempdir().unwrap();
        let populated = tempdir().unwrap();
        fs::write(populated.path().join("eng.traineddata"), b"stub").unwrap();

        let found = first_dir_with_traineddata(
            vec![empty.path().to_path_buf(), populated.path().to_path_buf()],
            "eng",
        );
        assert_eq!(found, Some(populated.path().to_path_buf()));
        assert_eq!(
            first_dir_with_traineddata(vec![empty.path().to_path_buf()], "eng"),
            None
        );
    }

    #[test]
    fn test_configured_executable_wins() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("tesseract-custom");
        fs::write(&exe, b"").unwrap();
        assert_eq!(find_tesseract_executable(Some(exe.as_path())).unwrap(), exe);
    }
}
