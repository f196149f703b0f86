//! Saved-recording history.

pub mod recordings;

pub use recordings::RecordingHistory;
