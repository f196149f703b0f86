//! In-memory doubles for the session's collaborators.

use crate::capture::recorder::DataReady;
use crate::capture::{CaptureDevice, CaptureStream, MediaConstraints, RecordedData, Recorder};
use crate::media::{DownloadSink, MediaArtifact, MimeType};
use crate::transcode::TranscodeEngine;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::oneshot;

/// Capture device that grants or denies access.
pub struct FakeCapture {
    pub deny: bool,
    pub requests: Vec<MediaConstraints>,
}

impl FakeCapture {
    pub fn granting() -> Self {
        Self {
            deny: false,
            requests: Vec::new(),
        }
    }

    pub fn denying() -> Self {
        Self {
            deny: true,
            requests: Vec::new(),
        }
    }
}

impl CaptureDevice for FakeCapture {
    async fn open(&mut self, constraints: MediaConstraints) -> Result<CaptureStream> {
        self.requests.push(constraints);
        if self.deny {
            return Err(anyhow!("Permission denied"));
        }
        Ok(CaptureStream::new("fake camera", Vec::new(), constraints))
    }
}

/// Recorder that "encodes" a fixed payload.
pub struct FakeRecorder {
    pub payload: Vec<u8>,
    pub starts: usize,
    pub stops: usize,
    /// Deliver an encoder error instead of the payload on stop
    pub fail_delivery: bool,
    recording: Option<MimeType>,
}

impl FakeRecorder {
    pub fn with_payload(payload: &[u8]) -> Self {
        Self {
            payload: payload.to_vec(),
            starts: 0,
            stops: 0,
            fail_delivery: false,
            recording: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }
}

impl Recorder for FakeRecorder {
    fn start(&mut self, _stream: &CaptureStream, mime_type: MimeType) -> Result<()> {
        if self.recording.is_some() {
            return Err(anyhow!("A recording is already in progress"));
        }
        self.starts += 1;
        self.recording = Some(mime_type);
        Ok(())
    }

    fn stop(&mut self) -> Result<DataReady> {
        let mime_type = self
            .recording
            .take()
            .ok_or_else(|| anyhow!("Recorder is not recording"))?;
        self.stops += 1;
        let (tx, rx) = oneshot::channel();
        let data = if self.fail_delivery {
            Err(anyhow!("Recorder exited with exit status: 1: device disconnected"))
        } else {
            Ok(RecordedData {
                bytes: self.payload.clone(),
                mime_type,
            })
        };
        let _ = tx.send(data);
        Ok(rx)
    }
}

/// Engine whose filesystem is a map and whose `run` derives the output from the input.
#[derive(Default)]
pub struct FakeEngine {
    pub loaded: bool,
    pub loads: usize,
    pub fail_load: bool,
    pub fail_run: bool,
    pub files: BTreeMap<String, Vec<u8>>,
    pub writes: usize,
    pub produced: usize,
    pub unlinks: usize,
    pub runs: Vec<Vec<String>>,
}

impl TranscodeEngine for FakeEngine {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    async fn load(&mut self) -> Result<()> {
        self.loads += 1;
        if self.fail_load {
            return Err(anyhow!("engine failed to load"));
        }
        self.loaded = true;
        Ok(())
    }

    fn write_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.writes += 1;
        self.files.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn run(&mut self, args: &[String]) -> Result<()> {
        if !self.loaded {
            return Err(anyhow!("engine not loaded"));
        }
        self.runs.push(args.to_vec());
        if self.fail_run {
            return Err(anyhow!("ffmpeg exited with status 1"));
        }
        let input_pos = args
            .iter()
            .position(|a| a == "-i")
            .ok_or_else(|| anyhow!("missing -i"))?;
        let input = &args[input_pos + 1];
        let data = self
            .files
            .get(input)
            .ok_or_else(|| anyhow!("{input}: No such file or directory"))?
            .clone();
        let output = args.last().ok_or_else(|| anyhow!("missing output"))?.clone();
        let mut produced = format!("{output}:").into_bytes();
        produced.extend(data);
        self.files.insert(output, produced);
        self.produced += 1;
        Ok(())
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("{name}: No such file or directory"))
    }

    fn unlink(&mut self, name: &str) -> Result<()> {
        self.files
            .remove(name)
            .ok_or_else(|| anyhow!("{name}: No such file or directory"))?;
        self.unlinks += 1;
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }
}

/// Sink that keeps saved files in memory.
#[derive(Default)]
pub struct MemorySink {
    pub saved: Vec<(String, MediaArtifact)>,
}

impl MemorySink {
    pub fn names(&self) -> Vec<&str> {
        self.saved.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl DownloadSink for MemorySink {
    fn save(&mut self, file_name: &str, artifact: &MediaArtifact) -> Result<PathBuf> {
        self.saved.push((file_name.to_string(), artifact.clone()));
        Ok(PathBuf::from("/downloads").join(file_name))
    }
}
