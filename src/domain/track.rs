//! Track identity, search hits, and the local audio artifact.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

/// Stable identifier for one piece of media (the provider's video id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this track
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One normalized search result from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackHit {
    /// Track identifier, stable across repeated searches
    pub id: TrackId,

    /// Video title
    pub title: String,

    /// Channel / attribution label
    pub channel: String,

    /// Thumbnail URL (may be empty when the provider omits one)
    pub thumbnail_url: String,
}

/// Durable reference to an uploaded artifact.
///
/// Opaque token returned by the messaging host after an upload; reusable
/// to resend the same audio without re-uploading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef(String);

impl FileRef {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self(file_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A locally stored, transcoded audio file plus source metadata.
///
/// Owns its scratch directory: `dispose` removes it explicitly, and
/// dropping the value removes it as a backstop, so no local artifact
/// outlives the orchestration that created it.
#[derive(Debug)]
pub struct PreparedAudio {
    dir: TempDir,

    /// Path to the transcoded file inside the scratch directory
    pub path: PathBuf,

    /// Title extracted from the source
    pub title: String,

    /// Uploader / attribution, when the source carries one
    pub performer: Option<String>,

    /// Duration in seconds, when the source carries one
    pub duration_secs: Option<u32>,
}

impl PreparedAudio {
    pub fn new(
        dir: TempDir,
        path: PathBuf,
        title: String,
        performer: Option<String>,
        duration_secs: Option<u32>,
    ) -> Self {
        Self {
            dir,
            path,
            title,
            performer,
            duration_secs,
        }
    }

    /// Release the scratch directory and everything in it.
    pub fn dispose(self) {
        if let Err(e) = self.dir.close() {
            tracing::warn!(error = %e, "Failed to remove scratch directory");
        }
    }

    /// Persist the artifact past this handle (the scratch directory is
    /// not removed). Returns the file path.
    pub fn keep(self) -> PathBuf {
        let _ = self.dir.keep();
        self.path
    }
}
