//! Transcoding of raw recordings.
//!
//! The engine is ffmpeg running inside a private working directory that serves
//! as its virtual filesystem. A [`TranscodeJob`] stages the raw recording,
//! converts it, extracts a thumbnail, reads both results back and cleans up.

pub mod engine;
pub mod ffmpeg;
pub mod job;

pub use engine::{FfmpegEngine, TranscodeEngine};
pub use ffmpeg::{find_ffmpeg, find_ffplay, find_ffprobe};
pub use job::TranscodeJob;
