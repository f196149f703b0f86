//! Playback of saved recordings.
//!
//! Plays a file with ffplay. When playback runs to the end and the video is
//! published on the sharing server, one view is registered for it.
//!
//! ffplay exits with status 0 whether it reached the end or the user closed it,
//! so the end is detected by comparing wall-clock playback time against the
//! duration reported by ffprobe.

use crate::config::{paths, VidrecConfig};
use crate::history::RecordingHistory;
use crate::transcode::{find_ffplay, find_ffprobe};
use crate::views::ViewCounter;
use anyhow::anyhow;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Slack for rounding in the reported duration and ffplay's final frame.
const END_TOLERANCE: Duration = Duration::from_millis(500);

/// Plays `file`, or the newest saved recording when no file is given.
///
/// # Arguments
/// * `file` - Media file to play
/// * `index` - History position to play when `file` is absent (1 = newest)
/// * `video_id` - Server id of the video; enables the view notification
///
/// # Errors
/// - If there is nothing to play
/// - If ffplay cannot be found or fails
/// - If a video id is given but no server is configured
pub async fn handle_play(
    file: Option<PathBuf>,
    index: Option<usize>,
    video_id: Option<String>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== vidrec Play Command ===");

    // Server must be valid before playback starts
    let counter = match &video_id {
        Some(_) => Some(ViewCounter::new(&VidrecConfig::load()?.server.base_url)?),
        None => None,
    };

    let path = match file {
        Some(path) => path,
        None => newest_saved_video(index.unwrap_or(1))?,
    };
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }

    let ffplay = tokio::task::spawn_blocking(find_ffplay)
        .await
        .map_err(|e| anyhow!("ffplay lookup task failed: {e}"))??;

    let duration = match &counter {
        Some(_) => probe_duration(&path).await,
        None => None,
    };

    tracing::info!("Playing {}", path.display());
    let started = Instant::now();
    let status = Command::new(&ffplay)
        .args(["-autoexit", "-loglevel", "error", "-window_title", "vidrec"])
        .arg(&path)
        .status()
        .await
        .map_err(|e| anyhow!("Failed to start ffplay: {e}"))?;
    let elapsed = started.elapsed();

    if !status.success() {
        tracing::info!("Playback failed ({})", status);
        return Ok(());
    }

    let (Some(counter), Some(video_id)) = (counter, video_id) else {
        return Ok(());
    };
    let Some(duration) = duration else {
        tracing::warn!(
            "Duration of {} is unknown; not registering a view",
            path.display()
        );
        return Ok(());
    };
    if !playback_completed(elapsed, duration) {
        tracing::info!(
            "Playback closed after {:.1}s of {:.1}s; not registering a view",
            elapsed.as_secs_f64(),
            duration.as_secs_f64()
        );
        return Ok(());
    }

    tracing::info!("Playback finished for {}", path.display());
    if let Err(e) = counter.notify_ended(&video_id).await {
        tracing::debug!("View notification task failed: {}", e);
    }
    Ok(())
}

/// Whether a playback that ran for `elapsed` reached the end of a `duration`-long video.
fn playback_completed(elapsed: Duration, duration: Duration) -> bool {
    elapsed + END_TOLERANCE >= duration
}

/// Container duration as reported by ffprobe, if it has one.
async fn probe_duration(path: &Path) -> Option<Duration> {
    let ffprobe = match tokio::task::spawn_blocking(find_ffprobe).await {
        Ok(Ok(binary)) => binary,
        Ok(Err(e)) => {
            tracing::warn!("ffprobe unavailable: {}", e);
            return None;
        }
        Err(e) => {
            tracing::warn!("ffprobe lookup task failed: {}", e);
            return None;
        }
    };

    let output = Command::new(&ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| tracing::warn!("Failed to run ffprobe: {}", e))
        .ok()?;

    if !output.status.success() {
        tracing::warn!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }
    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

/// Parses ffprobe's `format=duration` value in seconds. Streamed webm reports `N/A`.
fn parse_duration(stdout: &str) -> Option<Duration> {
    let seconds: f64 = stdout.trim().parse().ok()?;
    if seconds.is_finite() && seconds > 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}

fn newest_saved_video(index: usize) -> Result<PathBuf, anyhow::Error> {
    let history = RecordingHistory::new(&paths::data_dir()?)?;
    let total = history.list()?.len();
    if total == 0 {
        return Err(anyhow!("No saved recordings found in history"));
    }

    let entry = history.get(index)?.ok_or_else(|| {
        anyhow!("Recording index out of range. Available recordings: 1-{total}")
    })?;
    let video = entry
        .existing_files()
        .first()
        .map(|path| path.to_path_buf())
        .ok_or_else(|| anyhow!("The files saved by recording #{index} no longer exist"))?;
    Ok(video)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quitting_early_is_not_a_completed_playback() {
        let duration = Duration::from_secs(10);
        assert!(!playback_completed(Duration::from_secs(1), duration));
        assert!(!playback_completed(Duration::from_millis(9_000), duration));
    }

    #[test]
    fn test_reaching_the_end_is_a_completed_playback() {
        let duration = Duration::from_secs(10);
        assert!(playback_completed(Duration::from_millis(9_700), duration));
        assert!(playback_completed(Duration::from_secs(10), duration));
        // Pausing makes playback take longer than the video
        assert!(playback_completed(Duration::from_secs(25), duration));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.500000\n"), Some(Duration::from_millis(12_500)));
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("0.000000"), None);
    }
}
