//! Interactive recording.
//!
//! Opens the camera, runs the recording session in the terminal UI and saves
//! each finished cycle. Paths of saved files are printed to stdout on exit so
//! the command composes with other tools. SIGUSR1 activates the control like a
//! key press.

use crate::capture::{FfmpegCapture, FfmpegRecorder, MediaConstraints};
use crate::config::{paths, VidrecConfig};
use crate::history::RecordingHistory;
use crate::media::{DirectorySink, MimeType};
use crate::session::{Activation, CycleReport, RecordingSession, SessionOptions};
use crate::transcode::{find_ffmpeg, FfmpegEngine, TranscodeJob};
use crate::ui::{error::report, RecorderTui, SessionView, UiCommand};
use anyhow::anyhow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Session = RecordingSession<FfmpegRecorder, FfmpegEngine, DirectorySink>;

/// Runs the recorder until the user quits.
///
/// # Arguments
/// * `transcode` - Overrides `transcode.enabled` from the config when set
/// * `output_dir` - Overrides `downloads.directory` from the config when set
///
/// # Errors
/// - If the configuration is invalid
/// - If the capture device cannot be opened
/// - If the terminal cannot be driven
pub async fn handle_record(
    transcode: Option<bool>,
    output_dir: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== vidrec Recorder Started ===");

    let config = match VidrecConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            report(&format!(
                "Configuration Error:\n\n{err}\n\nPlease check ~/.config/vidrec/vidrec.toml and try again."
            ))?;
            return Err(anyhow!("Configuration error: {err}"));
        }
    };

    let options = session_options(&config, transcode)?;
    let download_dir = match output_dir {
        Some(dir) => dir,
        None => config.downloads.resolve_directory()?,
    };
    let sink = DirectorySink::new(download_dir.clone())?;

    let ffmpeg = tokio::task::spawn_blocking(find_ffmpeg)
        .await
        .map_err(|e| anyhow!("ffmpeg lookup task failed: {e}"))??;

    tracing::info!(
        "Configuration loaded: recorder={}, downloads={}",
        options.mime_type,
        download_dir.display()
    );

    let mut capture = FfmpegCapture::new(config.capture.clone(), ffmpeg.clone());
    let session = match RecordingSession::open(
        &mut capture,
        MediaConstraints::default(),
        FfmpegRecorder::new(ffmpeg),
        FfmpegEngine::new(),
        sink,
        options,
    )
    .await
    {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to open capture device: {}", e);
            report(&format!(
                "Capture Error:\n\n{e}\n\nCheck that a camera and microphone are connected and that \
                 vidrec may use them. Run `vidrec list-devices` to see what is available."
            ))?;
            return Err(e);
        }
    };

    let history = RecordingHistory::new(&paths::data_dir()?)?;
    let trigger = register_trigger()?;

    let mut tui = RecorderTui::new()?;
    let saved = run_session(session, &mut tui, &history, &trigger).await;
    tui.cleanup()?;

    let saved = saved?;
    for path in &saved {
        println!("{}", path.display());
    }

    tracing::info!("=== vidrec Recorder Exited ({} file(s) saved) ===", saved.len());
    Ok(())
}

fn session_options(
    config: &VidrecConfig,
    transcode: Option<bool>,
) -> Result<SessionOptions, anyhow::Error> {
    let mime_type = MimeType::parse(&config.recorder.mime_type)
        .filter(|mime| *mime != MimeType::Jpeg)
        .ok_or_else(|| {
            anyhow!(
                "Unsupported recorder.mime_type '{}'. Use video/webm or video/mp4",
                config.recorder.mime_type
            )
        })?;

    let transcode = transcode.unwrap_or(config.transcode.enabled);
    if transcode && mime_type != MimeType::Webm {
        return Err(anyhow!(
            "Transcoding expects video/webm recordings; set recorder.mime_type = \"video/webm\" \
             or disable transcoding"
        ));
    }

    Ok(SessionOptions {
        mime_type,
        transcode: transcode.then(|| TranscodeJob::from_config(&config.transcode)),
    })
}

#[cfg(unix)]
fn register_trigger() -> Result<Arc<AtomicBool>, anyhow::Error> {
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&flag))
        .map_err(|e| anyhow!("Failed to register signal handler: {e}"))?;
    Ok(flag)
}

#[cfg(not(unix))]
fn register_trigger() -> Result<Arc<AtomicBool>, anyhow::Error> {
    Ok(Arc::new(AtomicBool::new(false)))
}

/// Event loop: input, activation, drawing. Returns every file saved.
async fn run_session(
    mut session: Session,
    tui: &mut RecorderTui,
    history: &RecordingHistory,
    trigger: &AtomicBool,
) -> Result<Vec<PathBuf>, anyhow::Error> {
    let mut saved = Vec::new();
    let mut status: Option<String> = None;

    loop {
        let mut activate = false;
        if trigger.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: activating control");
            activate = true;
        }

        match tui.handle_input()? {
            UiCommand::Continue => {}
            UiCommand::Activate => activate = true,
            UiCommand::Quit => {
                tracing::debug!("Quit requested in state {}", session.state().kind());
                break;
            }
        }

        if activate {
            let outcome = activate_once(&mut session, tui).await;
            match outcome {
                Ok(Some(cycle)) => {
                    status = Some(format!("saved {}", describe(&cycle)));
                    if let Err(e) = history.record(cycle.files.clone(), cycle.transcoded) {
                        tracing::warn!("Failed to save recording history: {}", e);
                    }
                    saved.extend(cycle.files);
                }
                Ok(None) => status = None,
                Err(e) => {
                    tracing::error!("Recording cycle failed: {:#}", e);
                    status = Some(format!("error: {e}"));
                }
            }
        }

        tui.render(&SessionView::of(&session, status.as_deref()))?;
    }

    Ok(saved)
}

/// Activates the control and runs any transcoding it starts.
async fn activate_once(
    session: &mut Session,
    tui: &mut RecorderTui,
) -> Result<Option<CycleReport>, anyhow::Error> {
    match session.activate().await? {
        Activation::Downloaded(cycle) => Ok(Some(cycle)),
        Activation::TranscodePending => {
            // The view is a snapshot, so the spinner keeps turning while the session is busy
            let view = SessionView::of(session, Some("transcoding"));
            let mut ticker = tokio::time::interval(Duration::from_millis(50));
            let drive = session.drive();
            tokio::pin!(drive);
            loop {
                tokio::select! {
                    result = &mut drive => return result,
                    _ = ticker.tick() => tui.render(&view)?,
                }
            }
        }
        Activation::Discarded => {
            tracing::info!("Empty recording discarded");
            Ok(None)
        }
        Activation::Ignored | Activation::Started | Activation::Stopped => Ok(None),
    }
}

fn describe(cycle: &CycleReport) -> String {
    cycle
        .files
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}
