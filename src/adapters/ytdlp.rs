//! yt-dlp fetch-and-transcode adapter.
//!
//! Spawns the yt-dlp binary to download a track's source audio and
//! extract it to mp3 inside a private, request-scoped scratch directory.
//! Concurrency is bounded by a worker semaphore and each invocation by a
//! wall-clock timeout; a timed-out process is killed. The caller owns
//! disposal of the returned artifact.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, instrument};

use super::AudioFetcher;
use crate::domain::{PreparedAudio, TrackId};

/// Errors from the fetch-and-transcode pipeline.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Source unreachable, unsupported format, or transcode failure
    #[error("fetch failed: {0}")]
    Failed(String),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetcher configuration
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Path to the yt-dlp binary
    pub binary_path: String,

    /// Scratch space root; each fetch gets a private subdirectory
    pub downloads_dir: PathBuf,

    /// Target bitrate in kbit/s for the extracted mp3
    pub bitrate_kbps: u32,

    /// Per-fetch wall-clock limit
    pub timeout: Duration,

    /// Maximum concurrent fetches
    pub max_concurrent: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            binary_path: "yt-dlp".to_string(),
            downloads_dir: std::env::temp_dir().join("jukebox"),
            bitrate_kbps: 192,
            timeout: Duration::from_secs(120),
            max_concurrent: 4,
        }
    }
}

/// Fetch-and-transcode via the yt-dlp CLI.
pub struct YtDlpFetcher {
    config: FetcherConfig,
    workers: Semaphore,
}

impl YtDlpFetcher {
    pub fn new(config: FetcherConfig) -> Self {
        let workers = Semaphore::new(config.max_concurrent.max(1));
        Self { config, workers }
    }

    /// Check that the binary is callable; returns its version string.
    pub async fn health_check(&self) -> Result<String, FetchError> {
        let output = Command::new(&self.config.binary_path)
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                FetchError::Failed(format!("cannot run {}: {}", self.config.binary_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Failed(format!(
                "{} --version failed: {}",
                self.config.binary_path,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl AudioFetcher for YtDlpFetcher {
    #[instrument(skip(self, track), fields(track = %track))]
    async fn prepare(&self, track: &TrackId) -> Result<PreparedAudio, FetchError> {
        let _permit = self
            .workers
            .acquire()
            .await
            .map_err(|_| FetchError::Failed("worker pool closed".to_string()))?;

        tokio::fs::create_dir_all(&self.config.downloads_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix(track.as_str())
            .tempdir_in(&self.config.downloads_dir)?;

        let out_template = scratch.path().join("%(id)s.%(ext)s");

        let child = Command::new(&self.config.binary_path)
            .arg(track.watch_url())
            .args(["--extract-audio", "--audio-format", "mp3"])
            .args(["--audio-quality", &format!("{}K", self.config.bitrate_kbps)])
            .args(["--no-playlist", "--no-progress", "--print-json"])
            .arg("--output")
            .arg(&out_template)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                FetchError::Failed(format!(
                    "failed to spawn {}: {}",
                    self.config.binary_path, e
                ))
            })?;

        // Dropping the wait future on timeout kills the process.
        let output = match timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout(self.config.timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Failed(format!(
                "yt-dlp exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let meta = parse_metadata(&output.stdout);
        let path = scratch.path().join(format!("{}.mp3", track.as_str()));
        if !tokio::fs::try_exists(&path).await? {
            return Err(FetchError::Failed(
                "transcoded file missing from output directory".to_string(),
            ));
        }

        debug!(path = %path.display(), "Fetch and transcode complete");

        Ok(PreparedAudio::new(
            scratch,
            path,
            meta.title.unwrap_or_else(|| track.as_str().to_string()),
            meta.uploader,
            meta.duration.map(|d| d.round() as u32),
        ))
    }
}

/// Best-effort metadata from yt-dlp's printed info JSON.
#[derive(Debug, Default, Deserialize)]
struct SourceMetadata {
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
}

fn parse_metadata(stdout: &[u8]) -> SourceMetadata {
    // --print-json emits a single JSON object line on stdout
    let text = String::from_utf8_lossy(stdout);
    text.lines()
        .find(|l| l.trim_start().starts_with('{'))
        .and_then(|l| serde_json::from_str(l).ok())
        .unwrap_or_default()
}
