//! Display recent log entries from the application.

use crate::config::paths;
use anyhow::anyhow;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_LINES: usize = 50;

/// Prints the tail of the newest log file.
///
/// # Errors
/// - If the log directory cannot be determined
/// - If the log file cannot be read
pub fn handle_logs() -> Result<(), anyhow::Error> {
    let log_dir = paths::log_dir()?;

    let Some(log_file) = latest_log(&log_dir) else {
        println!("No log files found in: {}", log_dir.display());
        println!("Logs are written once `vidrec` has run.");
        return Ok(());
    };

    let content =
        fs::read_to_string(&log_file).map_err(|e| anyhow!("Failed to read log file: {e}"))?;
    let lines = tail(&content, DEFAULT_LINES);

    println!("Log file: {}", log_file.display());
    println!();
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// Newest `vidrec.log*` file by modification time.
fn latest_log(log_dir: &Path) -> Option<PathBuf> {
    fs::read_dir(log_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with("vidrec.log"))
        })
        .filter_map(|entry| {
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((entry.path(), modified))
        })
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path)
}

fn tail(content: &str, count: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    lines[lines.len().saturating_sub(count)..].to_vec()
}
