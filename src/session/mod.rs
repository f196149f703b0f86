//! The recording session state machine.
//!
//! A [`RecordingSession`] walks one capture stream through
//! `Idle → Recording → Stopped → [Transcoding → Transcoded] → Idle`, driven by
//! a single [`ActionControl`]. Only one session exists per process; its fields
//! hold everything the workflow needs (stream, recorder, engine, artifacts).
//!
//! Activation is dispatched on the control's current [`Handler`], never on a
//! swapped callback, so a stray activation can only do what the control
//! advertises. While transcoding the control is disabled and activations are
//! ignored.

pub mod preview;
pub mod state;

#[cfg(test)]
mod tests;

pub use preview::{Preview, PreviewSource};
pub use state::{ActionControl, Handler, Icon, SessionState, StateKind};

use crate::capture::{CaptureDevice, CaptureStream, MediaConstraints, RecordedData, Recorder};
use crate::media::{DownloadLink, DownloadSink, MediaArtifact, MimeType, ObjectUrl, ObjectUrlRegistry};
use crate::transcode::{TranscodeEngine, TranscodeJob};
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const RECORDING_NAME: &str = "MyRecording";
const THUMBNAIL_NAME: &str = "MyThumbnail";

/// Per-session behavior chosen at startup.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Container for raw recordings
    pub mime_type: MimeType,
    /// Transcode stage; `None` saves the raw recording directly
    pub transcode: Option<TranscodeJob>,
}

/// Files saved by one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub files: Vec<PathBuf>,
    pub transcoded: bool,
}

/// Outcome of one activation of the control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Control was disabled
    Ignored,
    Started,
    /// Recording stopped and its data is previewing
    Stopped,
    /// Recording stopped without producing any data
    Discarded,
    /// Transcoding entered; call [`RecordingSession::drive`] to run it
    TranscodePending,
    Downloaded(CycleReport),
}

pub struct RecordingSession<R, E, D> {
    stream: CaptureStream,
    recorder: R,
    engine: E,
    sink: D,
    registry: ObjectUrlRegistry,
    preview: Preview,
    control: ActionControl,
    state: SessionState,
    options: SessionOptions,
}

impl<R, E, D> RecordingSession<R, E, D>
where
    R: Recorder,
    E: TranscodeEngine,
    D: DownloadSink,
{
    /// Opens the capture device and returns an idle session previewing it.
    ///
    /// # Errors
    /// If the device is missing or access is denied. No session exists in that case.
    pub async fn open<C: CaptureDevice>(
        capture: &mut C,
        constraints: MediaConstraints,
        recorder: R,
        engine: E,
        sink: D,
        options: SessionOptions,
    ) -> Result<Self> {
        let stream = capture.open(constraints).await?;
        let mut preview = Preview::default();
        preview.attach_stream(&stream);

        let granted = stream.constraints();
        tracing::info!(
            "Recording session ready: {}x{}, audio={}, transcode {}",
            granted.video.width,
            granted.video.height,
            granted.audio,
            if options.transcode.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            stream,
            recorder,
            engine,
            sink,
            registry: ObjectUrlRegistry::new(),
            preview,
            control: ActionControl::new(),
            state: SessionState::Idle,
            options,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn control(&self) -> &ActionControl {
        &self.control
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    #[cfg(test)]
    pub fn registry(&self) -> &ObjectUrlRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[cfg(test)]
    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn transcode_enabled(&self) -> bool {
        self.options.transcode.is_some()
    }

    /// Time spent in the current recording, if one is running.
    pub fn recording_elapsed(&self) -> Option<Duration> {
        match &self.state {
            SessionState::Recording { started_at } => Some(started_at.elapsed()),
            _ => None,
        }
    }

    /// Whether [`drive`](Self::drive) has work to do.
    #[cfg(test)]
    pub fn has_pending_work(&self) -> bool {
        matches!(self.state, SessionState::Transcoding { .. })
    }

    /// Activates the action control.
    ///
    /// # Errors
    /// If the recorder fails to start or stop, or a download cannot be saved.
    /// The session stays in the state it was in when the failing step began,
    /// except when the recorder fails to deliver its data: the session then
    /// returns to Idle with the control disabled.
    pub async fn activate(&mut self) -> Result<Activation> {
        if !self.control.is_enabled() {
            tracing::debug!("Activation ignored: control disabled ({})", self.state.kind());
            return Ok(Activation::Ignored);
        }

        match (self.control.handler(), &self.state) {
            (Handler::Start, SessionState::Idle) => self.start_recording(),
            (Handler::Stop, SessionState::Recording { .. }) => self.stop_recording().await,
            (Handler::Download, SessionState::Stopped { raw }) => {
                let raw = raw.clone();
                self.download(raw)
            }
            (handler, state) => Err(anyhow!(
                "Control handler {handler:?} does not match session state {}",
                state.kind()
            )),
        }
    }

    /// Runs pending transcoding and completes the cycle.
    ///
    /// Returns `None` when there is nothing to drive. On failure the control
    /// stays disabled; the cycle cannot continue.
    ///
    /// # Errors
    /// If the engine fails to load or run, or an output cannot be saved.
    pub async fn drive(&mut self) -> Result<Option<CycleReport>> {
        let raw = match &self.state {
            SessionState::Transcoding { raw } => raw.clone(),
            _ => return Ok(None),
        };
        let job = self
            .options
            .transcode
            .clone()
            .ok_or_else(|| anyhow!("Transcoding entered without a transcode stage"))?;

        if !self.engine.is_loaded() {
            tracing::info!("Loading transcoding engine");
            self.engine.load().await.map_err(|e| {
                tracing::error!("Failed to load transcoding engine: {}", e);
                e
            })?;
        }

        let raw_artifact = self
            .registry
            .resolve(&raw)
            .ok_or_else(|| anyhow!("Raw recording {raw} was released before transcoding"))?;
        let output = job.run(&mut self.engine, raw_artifact).await.map_err(|e| {
            tracing::error!("Transcoding failed: {}", e);
            e
        })?;

        let video = self.registry.create(output.video);
        let thumbnail = self.registry.create(output.thumbnail);
        self.enter(SessionState::Transcoded {
            raw: raw.clone(),
            video: video.clone(),
            thumbnail: thumbnail.clone(),
        });

        let video_name = file_name(RECORDING_NAME, MimeType::Mp4);
        let thumbnail_name = file_name(THUMBNAIL_NAME, MimeType::Jpeg);
        let files = vec![
            self.save(&video, &video_name)?,
            self.save(&thumbnail, &thumbnail_name)?,
        ];

        self.finish_cycle(&[raw, video, thumbnail]);
        Ok(Some(CycleReport {
            files,
            transcoded: true,
        }))
    }

    fn start_recording(&mut self) -> Result<Activation> {
        self.recorder.start(&self.stream, self.options.mime_type)?;
        self.control.bind(Handler::Stop, Icon::Stop, "Stop Recording");
        self.enter(SessionState::Recording {
            started_at: Instant::now(),
        });
        Ok(Activation::Started)
    }

    async fn stop_recording(&mut self) -> Result<Activation> {
        let data_ready = self.recorder.stop()?;
        let delivered = data_ready
            .await
            .map_err(|_| anyhow!("Recorder finished without delivering data"))
            .and_then(|result| result);
        let RecordedData { bytes, mime_type } = match delivered {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Recorder failed: {:#}", e);
                self.control.disable("Recorder failed");
                self.enter(SessionState::Idle);
                return Err(e);
            }
        };

        if bytes.is_empty() {
            tracing::warn!("Recording stopped with no data captured");
            self.control.bind(Handler::Start, Icon::Record, "Start Recording");
            self.enter(SessionState::Idle);
            return Ok(Activation::Discarded);
        }

        let raw = self.registry.create(MediaArtifact::new(bytes, mime_type));
        self.preview.play_artifact(&raw, true);
        self.control
            .bind(Handler::Download, Icon::Download, "Download Recording");
        self.enter(SessionState::Stopped { raw });
        Ok(Activation::Stopped)
    }

    fn download(&mut self, raw: ObjectUrl) -> Result<Activation> {
        if self.options.transcode.is_some() {
            self.control.disable("Transcoding…");
            self.enter(SessionState::Transcoding { raw });
            return Ok(Activation::TranscodePending);
        }

        let mime_type = self
            .registry
            .resolve(&raw)
            .map(|artifact| artifact.mime_type())
            .ok_or_else(|| anyhow!("Raw recording {raw} is no longer available"))?;
        let path = self.save(&raw, &file_name(RECORDING_NAME, mime_type))?;

        self.finish_cycle(&[raw]);
        Ok(Activation::Downloaded(CycleReport {
            files: vec![path],
            transcoded: false,
        }))
    }

    fn save(&mut self, url: &ObjectUrl, name: &str) -> Result<PathBuf> {
        DownloadLink::new(url, name).click(&self.registry, &mut self.sink)
    }

    /// Releases the cycle's artifacts and re-arms the control.
    fn finish_cycle(&mut self, urls: &[ObjectUrl]) {
        self.preview.pause();
        self.preview.attach_stream(&self.stream);
        for url in urls {
            self.registry.revoke(url);
        }
        if !self.registry.is_empty() {
            let leaked: Vec<String> = self
                .registry
                .live_urls()
                .iter()
                .map(ToString::to_string)
                .collect();
            tracing::warn!(
                "{} object URL(s) still live after cycle: {}",
                self.registry.live_count(),
                leaked.join(", ")
            );
        }
        self.control.bind(Handler::Start, Icon::Record, "Record Again");
        self.enter(SessionState::Idle);
    }

    fn enter(&mut self, next: SessionState) {
        tracing::info!("Session: {} -> {}", self.state.kind(), next.kind());
        self.state = next;
    }
}

fn file_name(stem: &str, mime_type: MimeType) -> String {
    format!("{stem}.{}", mime_type.extension())
}
