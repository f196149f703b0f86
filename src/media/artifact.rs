//! Media blobs and their MIME types.

use std::fmt;

/// MIME types produced by the recording workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeType {
    /// Raw recorder output
    Webm,
    /// Transcoded video
    Mp4,
    /// Extracted thumbnail
    Jpeg,
}

impl MimeType {
    /// Parses a MIME type string such as `video/webm`.
    ///
    /// Codec parameters (`video/webm;codecs=vp8`) are ignored.
    pub fn parse(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "video/webm" => Some(Self::Webm),
            "video/mp4" => Some(Self::Mp4),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webm => "video/webm",
            Self::Mp4 => "video/mp4",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// File extension used when the artifact is saved or staged for ffmpeg.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
            Self::Jpeg => "jpg",
        }
    }

    /// Container name passed to ffmpeg's `-f` option.
    pub fn ffmpeg_format(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
            Self::Jpeg => "mjpeg",
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A byte blob tagged with its MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    bytes: Vec<u8>,
    mime_type: MimeType,
}

impl MediaArtifact {
    pub fn new(bytes: Vec<u8>, mime_type: MimeType) -> Self {
        Self { bytes, mime_type }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> MimeType {
        self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

// Blobs can be megabytes; keep Debug output to the summary.
impl fmt::Debug for MediaArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaArtifact")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
