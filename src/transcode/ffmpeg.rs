//! Locating the ffmpeg toolchain.
//!
//! Looks in the usual per-platform install directories first, then asks the
//! shell. Terminal launchers often start with a stripped PATH, so the direct
//! lookups matter.

use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Finds the `ffmpeg` binary used for capture, recording and transcoding.
pub fn find_ffmpeg() -> Result<PathBuf> {
    find_tool("ffmpeg")
}

/// Finds the `ffplay` binary used for playback.
pub fn find_ffplay() -> Result<PathBuf> {
    find_tool("ffplay")
}

/// Finds the `ffprobe` binary used to read media durations.
pub fn find_ffprobe() -> Result<PathBuf> {
    find_tool("ffprobe")
}

fn install_dirs() -> Vec<PathBuf> {
    if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/opt/homebrew/bin"),
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/usr/bin"),
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            PathBuf::from("/usr/bin"),
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/snap/bin"),
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            PathBuf::from("C:\\ffmpeg\\bin"),
            PathBuf::from("C:\\Program Files\\ffmpeg\\bin"),
            PathBuf::from("C:\\Program Files (x86)\\ffmpeg\\bin"),
        ]
    } else {
        Vec::new()
    }
}

fn binary_file_name(tool: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{tool}.exe")
    } else {
        tool.to_string()
    }
}

fn find_tool(tool: &str) -> Result<PathBuf> {
    let file_name = binary_file_name(tool);
    if let Some(path) = install_dirs()
        .into_iter()
        .map(|dir| dir.join(&file_name))
        .find(|path| path.exists())
    {
        tracing::debug!("Found {} at: {}", tool, path.display());
        return Ok(path);
    }

    let path = search_path(tool)?;
    tracing::debug!("Found {} in PATH at: {}", tool, path.display());
    Ok(path)
}

/// Resolves a binary through `which` (Unix) or `where` (Windows).
fn search_path(tool: &str) -> Result<PathBuf> {
    let lookup = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = std::process::Command::new(lookup)
        .arg(tool)
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for {tool}: {e}"))?;

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        // `where` may list several matches, one per line
        if let Some(first) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
            return Ok(PathBuf::from(first));
        }
    }

    Err(anyhow!(
        "{tool} not found. Please install ffmpeg:\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
         Windows: Download from https://ffmpeg.org/download.html"
    ))
}
