//! Filesystem locations used by vidrec.

use anyhow::anyhow;
use std::path::PathBuf;

fn home_dir() -> anyhow::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// `~/.config/vidrec`
pub fn config_dir() -> anyhow::Result<PathBuf> {
    Ok(home_dir()?.join(".config").join("vidrec"))
}

/// `~/.config/vidrec/vidrec.toml`
pub fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("vidrec.toml"))
}

/// `~/.local/share/vidrec`, home of the recording history.
pub fn data_dir() -> anyhow::Result<PathBuf> {
    Ok(home_dir()?.join(".local").join("share").join("vidrec"))
}

/// Log directory, following the XDG Base Directory Specification.
///
/// Prefers `$XDG_STATE_HOME/vidrec`, otherwise `~/.local/state/vidrec`.
pub fn log_dir() -> anyhow::Result<PathBuf> {
    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        if !xdg_state.is_empty() {
            return Ok(PathBuf::from(xdg_state).join("vidrec"));
        }
    }
    Ok(home_dir()?.join(".local").join("state").join("vidrec"))
}

/// Where downloads land when the config does not name a directory.
pub fn default_download_dir() -> anyhow::Result<PathBuf> {
    match dirs::download_dir() {
        Some(dir) => Ok(dir),
        None => Ok(home_dir()?.join("Downloads")),
    }
}
