//! Session states and the action control that exposes them.

use crate::media::ObjectUrl;
use std::fmt;
use std::time::Instant;

/// What activating the control will do.
///
/// The control holds exactly one of these at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Start,
    Stop,
    Download,
}

/// Symbol drawn on the control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Record,
    Stop,
    Download,
    Busy,
}

impl Icon {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Record => "●",
            Self::Stop => "■",
            Self::Download => "⭳",
            Self::Busy => "…",
        }
    }
}

/// The single button driving a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionControl {
    handler: Handler,
    icon: Icon,
    label: String,
    enabled: bool,
}

impl ActionControl {
    pub(crate) fn new() -> Self {
        Self {
            handler: Handler::Start,
            icon: Icon::Record,
            label: "Start Recording".to_string(),
            enabled: true,
        }
    }

    /// Replaces the handler together with the icon and label that advertise it.
    pub(crate) fn bind(&mut self, handler: Handler, icon: Icon, label: &str) {
        self.handler = handler;
        self.icon = icon;
        self.label = label.to_string();
        self.enabled = true;
    }

    pub(crate) fn disable(&mut self, label: &str) {
        self.icon = Icon::Busy;
        self.label = label.to_string();
        self.enabled = false;
    }

    pub fn handler(&self) -> Handler {
        self.handler
    }

    pub fn icon(&self) -> Icon {
        self.icon
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Lifecycle position of a [`RecordingSession`](super::RecordingSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording {
        started_at: Instant,
    },
    /// Raw recording available and looping in the preview
    Stopped {
        raw: ObjectUrl,
    },
    Transcoding {
        raw: ObjectUrl,
    },
    /// Outputs ready; passed through on the way back to Idle
    Transcoded {
        raw: ObjectUrl,
        video: ObjectUrl,
        thumbnail: ObjectUrl,
    },
}

impl SessionState {
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::Recording { .. } => StateKind::Recording,
            Self::Stopped { .. } => StateKind::Stopped,
            Self::Transcoding { .. } => StateKind::Transcoding,
            Self::Transcoded { .. } => StateKind::Transcoded,
        }
    }
}

/// Payload-free view of [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Idle,
    Recording,
    Stopped,
    Transcoding,
    Transcoded,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
            Self::Transcoding => "transcoding",
            Self::Transcoded => "transcoded",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_control_starts_recording() {
        let control = ActionControl::new();
        assert_eq!(control.handler(), Handler::Start);
        assert_eq!(control.icon(), Icon::Record);
        assert!(control.is_enabled());
    }

    #[test]
    fn test_disable_keeps_handler() {
        let mut control = ActionControl::new();
        control.bind(Handler::Download, Icon::Download, "Download Recording");
        control.disable("Transcoding…");

        assert!(!control.is_enabled());
        assert_eq!(control.handler(), Handler::Download);
        assert_eq!(control.label(), "Transcoding…");

        control.bind(Handler::Start, Icon::Record, "Record Again");
        assert!(control.is_enabled());
    }
}
