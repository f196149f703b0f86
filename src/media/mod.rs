//! In-memory media artifacts and the handles that reference them.
//!
//! Recorded and transcoded media never touch the disk until the user saves it.
//! Artifacts live in an [`ObjectUrlRegistry`] and are passed around by
//! [`ObjectUrl`] handles, which must be revoked once nothing displays them.

pub mod artifact;
pub mod download;
pub mod object_url;

pub use artifact::{MediaArtifact, MimeType};
pub use download::{DirectorySink, DownloadLink, DownloadSink};
pub use object_url::{ObjectUrl, ObjectUrlRegistry};
