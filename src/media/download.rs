//! Saving artifacts as named files.
//!
//! A download is a short-lived [`DownloadLink`]: it pairs an object URL with a
//! file name, is clicked exactly once, and is then dropped. The bytes are
//! resolved from the registry at click time and handed to a [`DownloadSink`].

use super::{MediaArtifact, ObjectUrl, ObjectUrlRegistry};
use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Destination for clicked download links.
pub trait DownloadSink {
    /// Persists the artifact under the suggested file name and returns where it landed.
    fn save(&mut self, file_name: &str, artifact: &MediaArtifact) -> Result<PathBuf>;
}

/// Transient link that triggers a single save.
#[derive(Debug)]
pub struct DownloadLink {
    href: ObjectUrl,
    download: String,
}

impl DownloadLink {
    pub fn new(href: &ObjectUrl, file_name: impl Into<String>) -> Self {
        Self {
            href: href.clone(),
            download: file_name.into(),
        }
    }

    /// Resolves the link's target and saves it through the sink.
    ///
    /// Consumes the link; it is never clicked twice.
    ///
    /// # Errors
    /// - If the URL has already been revoked
    /// - If the sink fails to write the file
    pub fn click(
        self,
        registry: &ObjectUrlRegistry,
        sink: &mut dyn DownloadSink,
    ) -> Result<PathBuf> {
        let artifact = registry
            .resolve(&self.href)
            .ok_or_else(|| anyhow!("Download target {} is no longer available", self.href))?;
        let path = sink.save(&self.download, artifact)?;
        tracing::info!(
            "Downloaded {} as {} ({} bytes)",
            self.href,
            path.display(),
            artifact.len()
        );
        Ok(path)
    }
}

/// Writes downloads into a directory, never overwriting an existing file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    /// Creates the sink, creating the directory if needed.
    ///
    /// # Errors
    /// - If the directory cannot be created
    pub fn new(directory: PathBuf) -> Result<Self> {
        fs::create_dir_all(&directory).map_err(|e| {
            anyhow!(
                "Failed to create download directory {}: {e}",
                directory.display()
            )
        })?;
        Ok(Self { directory })
    }

}

impl DownloadSink for DirectorySink {
    fn save(&mut self, file_name: &str, artifact: &MediaArtifact) -> Result<PathBuf> {
        let path = available_path(&self.directory, file_name);
        fs::write(&path, artifact.bytes())
            .map_err(|e| anyhow!("Failed to write {}: {e}", path.display()))?;
        Ok(path)
    }
}

/// Picks `name`, or `stem (n).ext` for the first free `n`, inside `dir`.
fn available_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };

    (1..)
        .map(|n| match extension {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
