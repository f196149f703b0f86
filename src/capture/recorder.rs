//! Encoding a capture stream into a container.

use super::CaptureStream;
use crate::media::MimeType;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::oneshot;

/// Encoded output of one recording.
#[derive(Debug)]
pub struct RecordedData {
    pub bytes: Vec<u8>,
    pub mime_type: MimeType,
}

/// Resolves once, when the recorder has flushed everything it encoded.
pub type DataReady = oneshot::Receiver<Result<RecordedData>>;

/// Encoder bound to a capture stream.
pub trait Recorder {
    /// Begins encoding `stream` into the container named by `mime_type`.
    ///
    /// # Errors
    /// If a recording is already running or the encoder cannot start.
    fn start(&mut self, stream: &CaptureStream, mime_type: MimeType) -> Result<()>;

    /// Asks the encoder to finish.
    ///
    /// The returned receiver yields the recording's bytes exactly once.
    ///
    /// # Errors
    /// If nothing is being recorded.
    fn stop(&mut self) -> Result<DataReady>;
}

struct ActiveRecording {
    stop_tx: oneshot::Sender<()>,
    data_rx: DataReady,
}

/// Records by running ffmpeg with the stream's input and collecting stdout.
///
/// Stopping writes `q` to ffmpeg's stdin so the container trailer is written
/// before the process exits.
pub struct FfmpegRecorder {
    binary: PathBuf,
    active: Option<ActiveRecording>,
}

impl FfmpegRecorder {
    pub fn new(binary: PathBuf) -> Self {
        Self {
            binary,
            active: None,
        }
    }
}

/// Encoder options for each recordable container.
fn codec_args(mime_type: MimeType) -> Result<Vec<&'static str>> {
    match mime_type {
        MimeType::Webm => Ok(vec![
            "-c:v", "libvpx", "-deadline", "realtime", "-cpu-used", "8", "-b:v", "1M", "-c:a",
            "libopus",
        ]),
        MimeType::Mp4 => Ok(vec![
            "-c:v", "libx264", "-preset", "veryfast", "-c:a", "aac", "-movflags",
            "frag_keyframe+empty_moov",
        ]),
        MimeType::Jpeg => Err(anyhow!("{mime_type} is not a recordable container")),
    }
}

impl Recorder for FfmpegRecorder {
    fn start(&mut self, stream: &CaptureStream, mime_type: MimeType) -> Result<()> {
        if self.active.is_some() {
            return Err(anyhow!("A recording is already in progress"));
        }

        let mut child = Command::new(&self.binary)
            .args(["-hide_banner", "-loglevel", "error"])
            .args(stream.input_args())
            .args(codec_args(mime_type)?)
            .args(["-f", mime_type.ffmpeg_format(), "pipe:1"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow!("Failed to start recorder: {e}"))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Recorder stdin unavailable"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Recorder stdout unavailable"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("Recorder stderr unavailable"))?;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (data_tx, data_rx) = oneshot::channel();

        tokio::spawn(async move {
            let collect_stdout = async {
                let mut buf = Vec::new();
                stdout.read_to_end(&mut buf).await.map(|_| buf)
            };
            let collect_stderr = async {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            };
            let quit = async move {
                // A dropped sender also ends the recording
                let _ = stop_rx.await;
                if let Err(e) = stdin.write_all(b"q").await {
                    tracing::debug!("Recorder stdin closed before quit: {}", e);
                }
                let _ = stdin.shutdown().await;
            };

            let (bytes, stderr_text, ()) = tokio::join!(collect_stdout, collect_stderr, quit);

            let result = match (bytes, child.wait().await) {
                (Err(e), _) => Err(anyhow!("Failed to read recorder output: {e}")),
                (_, Err(e)) => Err(anyhow!("Failed to wait for recorder: {e}")),
                (Ok(bytes), Ok(status)) if !status.success() && bytes.is_empty() => Err(anyhow!(
                    "Recorder exited with {status}: {}",
                    stderr_text.trim()
                )),
                (Ok(bytes), Ok(status)) => {
                    if !status.success() {
                        tracing::warn!("Recorder exited with {} after producing output", status);
                    }
                    Ok(RecordedData { bytes, mime_type })
                }
            };

            if data_tx.send(result).is_err() {
                tracing::debug!("Recording finished after its receiver was dropped");
            }
        });

        tracing::info!("Recorder started ({})", mime_type);
        self.active = Some(ActiveRecording { stop_tx, data_rx });
        Ok(())
    }

    fn stop(&mut self) -> Result<DataReady> {
        let active = self
            .active
            .take()
            .ok_or_else(|| anyhow!("Recorder is not recording"))?;
        // The encoder task may already have exited; its result is still in data_rx
        let _ = active.stop_tx.send(());
        tracing::info!("Recorder stop requested");
        Ok(active.data_rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_args_reject_images() {
        assert!(codec_args(MimeType::Jpeg).is_err());
        assert!(codec_args(MimeType::Webm).unwrap().contains(&"libvpx"));
    }

    #[test]
    fn test_stop_without_start_fails() {
        let mut recorder = FfmpegRecorder::new(PathBuf::from("ffmpeg"));
        assert!(recorder.active.is_none());
        assert!(recorder.stop().is_err());
    }
}
