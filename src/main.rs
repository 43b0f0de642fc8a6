//! Scale OCR
//!
//! Watches a digital scale through a webcam, reads the display with Tesseract
//! and prints the weight once consecutive readings settle.

mod capture;
mod config;
mod monitor;
mod ocr;
mod paths;
mod preview;
mod stabilizer;
mod vision;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::process::ExitCode;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let line = timestamped(msg);
    print!("{}", line);
    append_to_log_file(&line);
}

/// Logs a message to the log file only, leaving stdout untouched.
pub fn log_to_file(msg: &str) {
    append_to_log_file(&timestamped(msg));
}

fn timestamped(msg: &str) -> String {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    format!("[{}] {}\n", timestamp, msg)
}

fn append_to_log_file(line: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths::get_log_file())
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> ExitCode {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprint!("{}", log_msg);
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths::get_log_file())
        {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    // Ensure output directories exist
    if let Err(e) = paths::ensure_directories() {
        eprintln!("Failed to create log directory: {}", e);
    }

    let config = config::load_config();

    match monitor::run(&config) {
        Ok(()) => {
            log("Scale OCR exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{:#}", e);
            log(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}
