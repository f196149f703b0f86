//! Camera and microphone capture.
//!
//! A [`CaptureDevice`] is opened once per session and yields a
//! [`CaptureStream`]; a [`Recorder`] encodes that stream until stopped and then
//! hands back the encoded bytes exactly once.

pub mod device;
pub mod recorder;

pub use device::{CaptureBackend, CaptureDevice, CaptureStream, FfmpegCapture, MediaConstraints, VideoConstraints};
pub use recorder::{FfmpegRecorder, RecordedData, Recorder};
