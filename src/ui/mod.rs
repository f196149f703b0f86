//! Terminal screens.

pub mod error;
pub mod recorder;

pub use recorder::{RecorderTui, SessionView, UiCommand};
