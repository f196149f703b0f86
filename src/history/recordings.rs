//! History of saved recordings.
//!
//! Each completed cycle leaves one JSON file describing what was saved. Only the
//! newest entries are kept; the saved media itself belongs to the user and is
//! never deleted.

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of entries kept before the oldest are pruned.
const MAX_ENTRIES: usize = 10;

/// One completed recording cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedRecording {
    /// Millisecond timestamp, unique per entry
    pub id: String,
    /// Files written by the cycle, video first
    pub files: Vec<PathBuf>,
    /// Whether the recording went through the transcode stage
    pub transcoded: bool,
    pub created_at: DateTime<Local>,
}

impl SavedRecording {
    /// Files from this entry that still exist on disk.
    pub fn existing_files(&self) -> Vec<&PathBuf> {
        self.files.iter().filter(|path| path.exists()).collect()
    }
}

/// JSON-file store under `<data_dir>/recording_history`.
pub struct RecordingHistory {
    history_dir: PathBuf,
}

impl RecordingHistory {
    /// Opens the store, creating its directory.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let history_dir = data_dir.join("recording_history");
        fs::create_dir_all(&history_dir)?;
        Ok(Self { history_dir })
    }

    /// Records a completed cycle and prunes entries beyond the newest ten.
    pub fn record(&self, files: Vec<PathBuf>, transcoded: bool) -> Result<SavedRecording> {
        let mut created_at = Local::now();
        // Keep ids strictly increasing even for cycles inside one millisecond
        if let Some(newest) = self.list()?.first() {
            if created_at.timestamp_millis() <= newest.created_at.timestamp_millis() {
                created_at = newest.created_at + chrono::Duration::milliseconds(1);
            }
        }
        let id = created_at.timestamp_millis().to_string();

        let entry = SavedRecording {
            id: id.clone(),
            files,
            transcoded,
            created_at,
        };
        fs::write(self.entry_path(&id), serde_json::to_string_pretty(&entry)?)?;
        tracing::info!("Recording history entry saved with ID: {}", id);

        self.prune()?;
        Ok(entry)
    }

    /// All entries, newest first. Unreadable entries are skipped.
    pub fn list(&self) -> Result<Vec<SavedRecording>> {
        let mut entries: Vec<SavedRecording> = fs::read_dir(&self.history_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                let content = fs::read_to_string(&path).ok()?;
                match serde_json::from_str(&content) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable history entry {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Entry by 1-based position, 1 being the newest.
    pub fn get(&self, index: usize) -> Result<Option<SavedRecording>> {
        if index == 0 {
            return Ok(None);
        }
        Ok(self.list()?.into_iter().nth(index - 1))
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.history_dir.join(format!("{id}.json"))
    }

    fn prune(&self) -> Result<()> {
        for stale in self.list()?.iter().skip(MAX_ENTRIES) {
            let path = self.entry_path(&stale.id);
            match fs::remove_file(&path) {
                Ok(()) => tracing::debug!("Pruned history entry {}", stale.id),
                Err(e) => tracing::warn!("Failed to prune history entry {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}
