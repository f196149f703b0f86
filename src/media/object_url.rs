//! Revocable handles to in-memory artifacts.
//!
//! Every handle minted by [`ObjectUrlRegistry::create`] keeps its artifact alive
//! until [`ObjectUrlRegistry::revoke`] is called. Forgetting to revoke a handle
//! holds the blob for the life of the process, so the registry can always report
//! which handles are still live.

use super::MediaArtifact;
use std::collections::HashMap;
use std::fmt;

const URL_PREFIX: &str = "blob:vidrec/";

/// Ephemeral reference to an artifact held by an [`ObjectUrlRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owns every artifact that is currently reachable through an [`ObjectUrl`].
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: HashMap<ObjectUrl, MediaArtifact>,
    next_id: u64,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the artifact and returns a fresh handle to it.
    pub fn create(&mut self, artifact: MediaArtifact) -> ObjectUrl {
        self.next_id += 1;
        let url = ObjectUrl(format!("{URL_PREFIX}{}", self.next_id));
        tracing::debug!(
            "Created object URL {} ({}, {} bytes)",
            url,
            artifact.mime_type(),
            artifact.len()
        );
        self.entries.insert(url.clone(), artifact);
        url
    }

    /// Looks up the artifact behind a live handle.
    pub fn resolve(&self, url: &ObjectUrl) -> Option<&MediaArtifact> {
        self.entries.get(url)
    }

    /// Releases a handle and drops its artifact.
    ///
    /// Returns `false` if the handle was unknown or already revoked.
    pub fn revoke(&mut self, url: &ObjectUrl) -> bool {
        match self.entries.remove(url) {
            Some(_) => {
                tracing::debug!("Revoked object URL {}", url);
                true
            }
            None => {
                tracing::warn!("Attempted to revoke unknown object URL {}", url);
                false
            }
        }
    }

    /// Handles that have been created and not yet revoked, in creation order.
    pub fn live_urls(&self) -> Vec<ObjectUrl> {
        let mut urls: Vec<ObjectUrl> = self.entries.keys().cloned().collect();
        urls.sort_by_key(|url| {
            url.as_str()
                .strip_prefix(URL_PREFIX)
                .and_then(|id| id.parse::<u64>().ok())
                .unwrap_or(u64::MAX)
        });
        urls
    }

    pub fn live_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of handles minted since the registry was created.
    #[cfg(test)]
    pub fn created_count(&self) -> u64 {
        self.next_id
    }
}

impl Drop for ObjectUrlRegistry {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            tracing::warn!(
                "Discarding {} object URL(s) that were never revoked",
                self.entries.len()
            );
        }
    }
}
