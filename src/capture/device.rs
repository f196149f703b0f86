//! Capture device access through ffmpeg input devices.

use crate::config::CaptureConfig;
use anyhow::{anyhow, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// How long the device probe may take before access is considered denied.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Requested video dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
}

/// What a capture request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: VideoConstraints,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: VideoConstraints {
                width: 400,
                height: 350,
            },
        }
    }
}

/// A live audio+video source.
///
/// Holds the ffmpeg input arguments that reproduce the opened device, so every
/// recording in the session reads from the same source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureStream {
    label: String,
    input_args: Vec<String>,
    constraints: MediaConstraints,
}

impl CaptureStream {
    pub fn new(label: impl Into<String>, input_args: Vec<String>, constraints: MediaConstraints) -> Self {
        Self {
            label: label.into(),
            input_args,
            constraints,
        }
    }

    /// Human-readable description of the source.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn input_args(&self) -> &[String] {
        &self.input_args
    }

    pub fn constraints(&self) -> MediaConstraints {
        self.constraints
    }
}

/// Source of capture streams.
#[allow(async_fn_in_trait)]
pub trait CaptureDevice {
    /// Requests access to the camera (and microphone when `constraints.audio`).
    ///
    /// # Errors
    /// If no matching device exists or access is denied.
    async fn open(&mut self, constraints: MediaConstraints) -> Result<CaptureStream>;
}

/// ffmpeg input device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureBackend {
    /// Video4Linux2 camera with PulseAudio microphone
    V4l2,
    /// macOS AVFoundation
    AvFoundation,
    /// Windows DirectShow
    DShow,
}

impl CaptureBackend {
    /// Picks the backend from the config override or the host platform.
    pub fn resolve(input_format: &str) -> Result<Self> {
        match input_format.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Self::for_host(),
            "v4l2" => Ok(Self::V4l2),
            "avfoundation" => Ok(Self::AvFoundation),
            "dshow" => Ok(Self::DShow),
            other => Err(anyhow!(
                "Unknown capture input_format '{other}'. Use auto, v4l2, avfoundation or dshow"
            )),
        }
    }

    fn for_host() -> Result<Self> {
        if cfg!(target_os = "linux") {
            Ok(Self::V4l2)
        } else if cfg!(target_os = "macos") {
            Ok(Self::AvFoundation)
        } else if cfg!(target_os = "windows") {
            Ok(Self::DShow)
        } else {
            Err(anyhow!(
                "No capture backend for this platform; set capture.input_format explicitly"
            ))
        }
    }

    /// Builds the ffmpeg input arguments for the configured devices.
    ///
    /// # Errors
    /// If DirectShow is selected without named devices.
    pub fn input_args(
        &self,
        config: &CaptureConfig,
        constraints: MediaConstraints,
    ) -> Result<Vec<String>> {
        let size = format!("{}x{}", constraints.video.width, constraints.video.height);
        let video_device = config.video_device.trim();
        let audio_device = config.audio_device.trim();

        let args = match self {
            Self::V4l2 => {
                let video = or_default(video_device, "/dev/video0");
                let mut args = strings(&["-f", "v4l2", "-video_size", &size, "-i", video]);
                if constraints.audio {
                    let audio = or_default(audio_device, "default");
                    args.extend(strings(&["-f", "pulse", "-i", audio]));
                }
                args
            }
            Self::AvFoundation => {
                let video = or_default(video_device, "0");
                let audio = if constraints.audio {
                    or_default(audio_device, "0")
                } else {
                    "none"
                };
                strings(&[
                    "-f",
                    "avfoundation",
                    "-framerate",
                    "30",
                    "-video_size",
                    &size,
                    "-i",
                    &format!("{video}:{audio}"),
                ])
            }
            Self::DShow => {
                if video_device.is_empty() || (constraints.audio && audio_device.is_empty()) {
                    return Err(anyhow!(
                        "DirectShow capture needs capture.video_device and capture.audio_device \
                         names (see `vidrec list-devices`)"
                    ));
                }
                let mut input = format!("video={video_device}");
                if constraints.audio {
                    input.push_str(&format!(":audio={audio_device}"));
                }
                strings(&["-f", "dshow", "-video_size", &size, "-i", &input])
            }
        };
        Ok(args)
    }
}

impl fmt::Display for CaptureBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4l2 => write!(f, "v4l2"),
            Self::AvFoundation => write!(f, "avfoundation"),
            Self::DShow => write!(f, "dshow"),
        }
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Opens the configured camera and microphone through ffmpeg.
pub struct FfmpegCapture {
    config: CaptureConfig,
    binary: PathBuf,
}

impl FfmpegCapture {
    /// `binary` is the ffmpeg executable that also runs the recorder.
    pub fn new(config: CaptureConfig, binary: PathBuf) -> Self {
        Self { config, binary }
    }
}

impl CaptureDevice for FfmpegCapture {
    async fn open(&mut self, constraints: MediaConstraints) -> Result<CaptureStream> {
        let backend = CaptureBackend::resolve(&self.config.input_format)?;
        let input_args = backend.input_args(&self.config, constraints)?;
        tracing::info!(
            "Requesting capture via {} ({}x{}, audio={})",
            backend,
            constraints.video.width,
            constraints.video.height,
            constraints.audio
        );

        // Grab a single frame to prove the device exists and we may read it
        let probe = Command::new(&self.binary)
            .args(["-hide_banner", "-nostdin", "-loglevel", "error"])
            .args(&input_args)
            .args(["-frames:v", "1", "-f", "null", "-"])
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(PROBE_TIMEOUT, probe)
            .await
            .map_err(|_| anyhow!("Timed out waiting for capture device access"))?
            .map_err(|e| anyhow!("Failed to run ffmpeg: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "Capture device unavailable or access denied: {}",
                stderr.trim()
            ));
        }

        let label = format!("{backend} {}", input_args.join(" "));
        tracing::info!("Capture stream opened: {}", label);
        Ok(CaptureStream::new(label, input_args, constraints))
    }
}
