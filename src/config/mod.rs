//! Configuration management for vidrec.
//!
//! Loads the TOML configuration file and resolves the directories vidrec reads
//! from and writes to.

pub mod file;
pub mod paths;

pub use file::{CaptureConfig, TranscodeConfig, VidrecConfig};
