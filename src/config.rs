//! Runtime configuration.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (secrets: BOT_TOKEN, YOUTUBE_API_KEY,
//!    OWNER_ID; overrides: JUKEBOX_YTDLP, JUKEBOX_DOWNLOADS_DIR)
//! 2. Config file (.jukebox/config.yaml, found by searching the current
//!    directory and its parents)
//! 3. Defaults
//!
//! Secrets are read once at startup; a missing secret is a fatal startup
//! error, never a runtime one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::FetcherConfig;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub cache: CacheSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchSection {
    pub timeout_seconds: Option<u64>,
    pub max_results: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchSection {
    pub binary_path: Option<String>,
    pub downloads_dir: Option<PathBuf>,
    pub bitrate_kbps: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub max_concurrent: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSection {
    pub result_ttl_seconds: Option<u64>,
    pub file_ref_capacity: Option<usize>,
}

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub bot_token: String,
    pub api_key: String,
    pub owner_id: i64,
    pub search: SearchSettings,
    pub fetcher: FetcherConfig,
    pub result_ttl: Duration,
    pub file_ref_capacity: usize,
    /// Path to the config file, when one was found
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub timeout: Duration,
    pub max_results: u8,
}

impl Settings {
    /// Load settings from the environment and an optional config file.
    pub fn load() -> Result<Self> {
        let bot_token = std::env::var("BOT_TOKEN").context("BOT_TOKEN is missing")?;
        let api_key = std::env::var("YOUTUBE_API_KEY").context("YOUTUBE_API_KEY is missing")?;
        let owner_id = std::env::var("OWNER_ID")
            .context("OWNER_ID is missing")?
            .parse::<i64>()
            .context("OWNER_ID is not a valid integer")?;

        let config_path = find_config_file();
        let file = match config_path {
            Some(ref path) => load_config_file(path)?,
            None => ConfigFile::default(),
        };

        Ok(Self::resolve(bot_token, api_key, owner_id, file, config_path))
    }

    /// Merge file values with defaults and environment overrides.
    fn resolve(
        bot_token: String,
        api_key: String,
        owner_id: i64,
        file: ConfigFile,
        config_file: Option<PathBuf>,
    ) -> Self {
        let search = SearchSettings {
            timeout: Duration::from_secs(file.search.timeout_seconds.unwrap_or(8)),
            max_results: file.search.max_results.unwrap_or(5),
        };

        let binary_path = std::env::var("JUKEBOX_YTDLP")
            .ok()
            .or(file.fetch.binary_path)
            .unwrap_or_else(|| "yt-dlp".to_string());
        let downloads_dir = std::env::var("JUKEBOX_DOWNLOADS_DIR")
            .ok()
            .map(PathBuf::from)
            .or(file.fetch.downloads_dir)
            .unwrap_or_else(default_downloads_dir);

        let fetcher = FetcherConfig {
            binary_path,
            downloads_dir,
            bitrate_kbps: file.fetch.bitrate_kbps.unwrap_or(192),
            timeout: Duration::from_secs(file.fetch.timeout_seconds.unwrap_or(120)),
            max_concurrent: file.fetch.max_concurrent.unwrap_or(4),
        };

        Self {
            bot_token,
            api_key,
            owner_id,
            search,
            fetcher,
            result_ttl: Duration::from_secs(file.cache.result_ttl_seconds.unwrap_or(300)),
            file_ref_capacity: file.cache.file_ref_capacity.unwrap_or(1024),
            config_file,
        }
    }

    /// Printable form with secrets redacted.
    pub fn redacted(&self) -> String {
        format!(
            "owner_id:                {}\n\
             search.timeout:          {:?}\n\
             search.max_results:      {}\n\
             fetch.binary:            {}\n\
             fetch.downloads_dir:     {}\n\
             fetch.bitrate:           {} kbps\n\
             fetch.timeout:           {:?}\n\
             fetch.max_concurrent:    {}\n\
             cache.result_ttl:        {:?}\n\
             cache.file_ref_capacity: {}\n\
             config_file:             {}",
            self.owner_id,
            self.search.timeout,
            self.search.max_results,
            self.fetcher.binary_path,
            self.fetcher.downloads_dir.display(),
            self.fetcher.bitrate_kbps,
            self.fetcher.timeout,
            self.fetcher.max_concurrent,
            self.result_ttl,
            self.file_ref_capacity,
            self.config_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string()),
        )
    }
}

fn default_downloads_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".jukebox")
        .join("downloads")
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(".jukebox").join("config.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
