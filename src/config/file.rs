//! Configuration file management for vidrec.
//!
//! This module handles loading application configuration from TOML files.
//! Every section and field has a default, so a partial file is valid.

use super::paths;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Capture device selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureConfig {
    /// ffmpeg input device family: "auto", "v4l2", "avfoundation" or "dshow"
    pub input_format: String,
    /// Camera to use. Empty selects the platform default
    /// (/dev/video0 on Linux, index 0 on macOS). Required on Windows.
    pub video_device: String,
    /// Microphone to use. Empty selects the platform default. Required on Windows.
    pub audio_device: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            input_format: "auto".to_string(),
            video_device: String::new(),
            audio_device: String::new(),
        }
    }
}

/// Recorder output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecorderConfig {
    /// Container the raw recording is encoded into
    pub mime_type: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            mime_type: "video/webm".to_string(),
        }
    }
}

/// Post-recording transcode stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Convert to mp4 and extract a thumbnail before saving
    pub enabled: bool,
    /// Output frame rate
    pub frame_rate: u32,
    /// Timestamp of the thumbnail frame (HH:MM:SS)
    pub thumbnail_at: String,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frame_rate: 60,
            thumbnail_at: "00:00:01".to_string(),
        }
    }
}

/// Where saved recordings go.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DownloadsConfig {
    /// Target directory. Empty means the OS downloads folder.
    pub directory: String,
}

impl DownloadsConfig {
    /// Resolves the download directory, expanding a leading `~/`.
    pub fn resolve_directory(&self) -> anyhow::Result<PathBuf> {
        let directory = self.directory.trim();
        if directory.is_empty() {
            return paths::default_download_dir();
        }
        if let Some(rest) = directory.strip_prefix("~/") {
            let home =
                dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
            return Ok(home.join(rest));
        }
        Ok(PathBuf::from(directory))
    }
}

/// Video-sharing server used for view counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL such as "http://localhost:4000". Empty disables notifications.
    pub base_url: String,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VidrecConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl VidrecConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = paths::config_path()?;
        let content = fs::read_to_string(&config_path)
            .map_err(|e| anyhow!("Failed to read {}: {e}", config_path.display()))?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// If the TOML is malformed or a field has the wrong type.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!("Invalid configuration: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = VidrecConfig::parse("").unwrap();
        assert_eq!(config, VidrecConfig::default());
        assert_eq!(config.capture.input_format, "auto");
        assert_eq!(config.recorder.mime_type, "video/webm");
        assert!(config.transcode.enabled);
        assert_eq!(config.transcode.frame_rate, 60);
    }

    #[test]
    fn test_partial_sections_and_version_line() {
        let config = VidrecConfig::parse(
            r#"config_version = "0.1.0"

[transcode]
enabled = false

[server]
base_url = "http://localhost:4000"
"#,
        )
        .unwrap();

        assert!(!config.transcode.enabled);
        assert_eq!(config.transcode.thumbnail_at, "00:00:01");
        assert_eq!(config.server.base_url, "http://localhost:4000");
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let err = VidrecConfig::parse("[transcode]\nframe_rate = \"fast\"").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_capture_size_and_audio_are_not_configurable() {
        // Files written by earlier releases may still carry these keys
        let config = VidrecConfig::parse(
            r#"[capture]
video_device = "/dev/video2"
audio = false
width = 1920
height = 1080
"#,
        )
        .unwrap();

        assert_eq!(
            config.capture,
            CaptureConfig {
                video_device: "/dev/video2".to_string(),
                ..CaptureConfig::default()
            }
        );
    }

    #[test]
    fn test_download_directory_expands_home() {
        let downloads = DownloadsConfig {
            directory: "~/Videos/vidrec".to_string(),
        };
        let resolved = downloads.resolve_directory().unwrap();
        assert!(resolved.ends_with("Videos/vidrec"));
        assert!(!resolved.starts_with("~"));
    }

    #[test]
    fn test_bundled_template_parses() {
        let config = VidrecConfig::parse(crate::setup::DEFAULT_CONFIG).unwrap();
        assert_eq!(config, VidrecConfig::default());
    }
}
