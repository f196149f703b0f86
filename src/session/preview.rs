//! What the preview pane is showing.

use crate::capture::CaptureStream;
use crate::media::ObjectUrl;

/// Source currently attached to the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSource {
    Detached,
    /// The live capture stream, by label
    Live(String),
    Artifact(ObjectUrl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    source: PreviewSource,
    looped: bool,
    playing: bool,
}

impl Default for Preview {
    fn default() -> Self {
        Self {
            source: PreviewSource::Detached,
            looped: false,
            playing: false,
        }
    }
}

impl Preview {
    pub fn attach_stream(&mut self, stream: &CaptureStream) {
        self.source = PreviewSource::Live(stream.label().to_string());
        self.looped = false;
        self.playing = true;
    }

    pub fn play_artifact(&mut self, url: &ObjectUrl, looped: bool) {
        self.source = PreviewSource::Artifact(url.clone());
        self.looped = looped;
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn source(&self) -> &PreviewSource {
        &self.source
    }

    pub fn is_looped(&self) -> bool {
        self.looped
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether the preview still points at `url`.
    pub fn references(&self, url: &ObjectUrl) -> bool {
        matches!(&self.source, PreviewSource::Artifact(current) if current == url)
    }
}
