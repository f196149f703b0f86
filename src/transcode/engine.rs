//! The transcoding engine and its virtual filesystem.

use super::ffmpeg::find_ffmpeg;
use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::process::Command;

/// A transcoder with a private filesystem.
///
/// Inputs are staged with [`write_file`](Self::write_file), processed by
/// [`run`](Self::run) and collected with [`read_file`](Self::read_file). Files
/// stay in the engine until [`unlink`](Self::unlink)ed, so callers own cleanup.
/// [`load`](Self::load) must succeed before any other operation.
#[allow(async_fn_in_trait)]
pub trait TranscodeEngine {
    fn is_loaded(&self) -> bool;

    async fn load(&mut self) -> Result<()>;

    fn write_file(&mut self, name: &str, data: &[u8]) -> Result<()>;

    /// Runs one ffmpeg invocation; file arguments are relative to the engine filesystem.
    async fn run(&mut self, args: &[String]) -> Result<()>;

    fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    fn unlink(&mut self, name: &str) -> Result<()>;

    /// Names currently present in the engine filesystem.
    fn list_files(&self) -> Result<Vec<String>>;
}

static WORKSPACE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// ffmpeg subprocess engine backed by a scratch directory.
///
/// The directory is removed when the engine is dropped.
#[derive(Debug, Default)]
pub struct FfmpegEngine {
    binary: Option<PathBuf>,
    workspace: Option<PathBuf>,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn workspace(&self) -> Result<&Path> {
        self.workspace
            .as_deref()
            .ok_or_else(|| anyhow!("Transcoding engine is not loaded"))
    }

    fn entry_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.workspace()?.join(name))
    }
}

impl TranscodeEngine for FfmpegEngine {
    fn is_loaded(&self) -> bool {
        self.binary.is_some() && self.workspace.is_some()
    }

    async fn load(&mut self) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }

        let binary = tokio::task::spawn_blocking(find_ffmpeg)
            .await
            .map_err(|e| anyhow!("ffmpeg lookup task failed: {e}"))??;

        let status = Command::new(&binary)
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| anyhow!("Failed to start {}: {e}", binary.display()))?;
        if !status.success() {
            return Err(anyhow!("{} -version exited with {status}", binary.display()));
        }

        let workspace = std::env::temp_dir().join(format!(
            "vidrec-engine-{}-{}",
            std::process::id(),
            WORKSPACE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&workspace)
            .map_err(|e| anyhow!("Failed to create engine workspace: {e}"))?;

        tracing::info!(
            "Transcoding engine loaded: {} (workspace {})",
            binary.display(),
            workspace.display()
        );
        self.binary = Some(binary);
        self.workspace = Some(workspace);
        Ok(())
    }

    fn write_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.entry_path(name)?;
        fs::write(&path, data).map_err(|e| anyhow!("Failed to stage {name}: {e}"))?;
        tracing::debug!("Engine FS: wrote {} ({} bytes)", name, data.len());
        Ok(())
    }

    async fn run(&mut self, args: &[String]) -> Result<()> {
        let binary = self
            .binary
            .clone()
            .ok_or_else(|| anyhow!("Transcoding engine is not loaded"))?;
        let workspace = self.workspace()?.to_path_buf();

        tracing::debug!("Engine run: ffmpeg {}", args.join(" "));
        let output = Command::new(&binary)
            .args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y"])
            .args(args)
            .current_dir(&workspace)
            .output()
            .await
            .map_err(|e| anyhow!("Failed to run ffmpeg: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "ffmpeg {} failed ({}): {}",
                args.join(" "),
                output.status,
                stderr.trim()
            ));
        }
        Ok(())
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.entry_path(name)?;
        fs::read(&path).map_err(|e| anyhow!("Failed to read {name} from engine: {e}"))
    }

    fn unlink(&mut self, name: &str) -> Result<()> {
        let path = self.entry_path(name)?;
        fs::remove_file(&path).map_err(|e| anyhow!("Failed to unlink {name}: {e}"))?;
        tracing::debug!("Engine FS: unlinked {}", name);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(self.workspace()?)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        Ok(names)
    }
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            if let Err(e) = fs::remove_dir_all(&workspace) {
                tracing::debug!("Failed to remove engine workspace: {}", e);
            }
        }
    }
}

/// Engine file names are flat; anything that could escape the workspace is rejected.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(anyhow!("Invalid engine file name: '{name}'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("recording.webm").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("../etc/passwd").is_err());
        assert!(validate_name("dir\\file").is_err());
    }

    #[test]
    fn test_operations_require_load() {
        let mut engine = FfmpegEngine::new();
        assert!(!engine.is_loaded());
        assert!(engine.write_file("recording.webm", b"x").is_err());
        assert!(engine.read_file("recording.webm").is_err());
        assert!(engine.unlink("recording.webm").is_err());
        assert!(engine.list_files().is_err());
    }

    #[test]
    fn test_virtual_fs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = FfmpegEngine {
            binary: Some(PathBuf::from("ffmpeg")),
            workspace: Some(dir.path().to_path_buf()),
        };

        engine.write_file("recording.webm", b"raw").unwrap();
        assert_eq!(engine.list_files().unwrap(), vec!["recording.webm"]);
        assert_eq!(engine.read_file("recording.webm").unwrap(), b"raw");

        engine.unlink("recording.webm").unwrap();
        assert!(engine.list_files().unwrap().is_empty());
        assert!(engine.unlink("recording.webm").is_err());
    }
}
