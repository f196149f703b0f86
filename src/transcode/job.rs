//! Converting a raw recording into a shareable video and thumbnail.

use super::TranscodeEngine;
use crate::config::TranscodeConfig;
use crate::media::{MediaArtifact, MimeType};
use anyhow::{anyhow, Result};

const INPUT_NAME: &str = "recording.webm";
const OUTPUT_NAME: &str = "output.mp4";
const THUMBNAIL_NAME: &str = "thumbnail.jpg";

/// Results of a completed job, already read out of the engine.
#[derive(Debug)]
pub struct TranscodeOutput {
    pub video: MediaArtifact,
    pub thumbnail: MediaArtifact,
}

/// One raw recording in, one mp4 and one jpeg out.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    frame_rate: u32,
    thumbnail_at: String,
}

impl TranscodeJob {
    pub fn new(frame_rate: u32, thumbnail_at: impl Into<String>) -> Self {
        Self {
            frame_rate,
            thumbnail_at: thumbnail_at.into(),
        }
    }

    pub fn from_config(config: &TranscodeConfig) -> Self {
        Self::new(config.frame_rate, config.thumbnail_at.clone())
    }

    /// `-i <input> -r <fps> <output>`
    pub fn transcode_args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            INPUT_NAME.to_string(),
            "-r".to_string(),
            self.frame_rate.to_string(),
            OUTPUT_NAME.to_string(),
        ]
    }

    /// `-i <input> -ss <at> -frames:v 1 <thumbnail>`
    pub fn thumbnail_args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            INPUT_NAME.to_string(),
            "-ss".to_string(),
            self.thumbnail_at.clone(),
            "-frames:v".to_string(),
            "1".to_string(),
            THUMBNAIL_NAME.to_string(),
        ]
    }

    /// Runs both conversions and returns their outputs.
    ///
    /// Every file staged or produced in the engine is unlinked before this
    /// returns, whether or not the job succeeded.
    ///
    /// # Errors
    /// - If the raw artifact is not webm
    /// - If either ffmpeg invocation fails
    /// - If an output cannot be read back
    pub async fn run<E: TranscodeEngine>(
        &self,
        engine: &mut E,
        raw: &MediaArtifact,
    ) -> Result<TranscodeOutput> {
        if raw.mime_type() != MimeType::Webm {
            return Err(anyhow!(
                "Cannot transcode {}: expected {}",
                raw.mime_type(),
                MimeType::Webm
            ));
        }

        let result = self.convert(engine, raw).await;
        let cleanup = release_files(engine);

        let output = result?;
        cleanup?;
        Ok(output)
    }

    async fn convert<E: TranscodeEngine>(
        &self,
        engine: &mut E,
        raw: &MediaArtifact,
    ) -> Result<TranscodeOutput> {
        engine.write_file(INPUT_NAME, raw.bytes())?;

        tracing::info!("Transcoding recording to {} fps mp4", self.frame_rate);
        engine.run(&self.transcode_args()).await?;

        tracing::info!("Extracting thumbnail at {}", self.thumbnail_at);
        engine.run(&self.thumbnail_args()).await?;

        let video = engine.read_file(OUTPUT_NAME)?;
        let thumbnail = engine.read_file(THUMBNAIL_NAME)?;

        tracing::info!(
            "Transcode finished: video {} bytes, thumbnail {} bytes",
            video.len(),
            thumbnail.len()
        );

        Ok(TranscodeOutput {
            video: MediaArtifact::new(video, MimeType::Mp4),
            thumbnail: MediaArtifact::new(thumbnail, MimeType::Jpeg),
        })
    }
}

/// Unlinks whatever the job left in the engine filesystem.
fn release_files<E: TranscodeEngine>(engine: &mut E) -> Result<()> {
    let present = engine.list_files()?;
    for name in [INPUT_NAME, OUTPUT_NAME, THUMBNAIL_NAME] {
        if present.iter().any(|p| p == name) {
            engine.unlink(name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_args() {
        let job = TranscodeJob::new(60, "00:00:01");
        assert_eq!(
            job.transcode_args(),
            ["-i", "recording.webm", "-r", "60", "output.mp4"]
        );
    }

    #[test]
    fn test_thumbnail_args() {
        let job = TranscodeJob::new(60, "00:00:01");
        assert_eq!(
            job.thumbnail_args(),
            [
                "-i",
                "recording.webm",
                "-ss",
                "00:00:01",
                "-frames:v",
                "1",
                "thumbnail.jpg"
            ]
        );
    }
}
