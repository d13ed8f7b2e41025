//! jukebox - inline music search and delivery bot
//!
//! Sits between a Telegram update stream and two external systems: the
//! YouTube Data API for keyword search and a yt-dlp fetch-and-transcode
//! pipeline for audio delivery.
//!
//! # Architecture
//!
//! Two cached flows:
//! - Inline query -> search cache -> (miss) provider search -> answer,
//!   cached with a fixed TTL
//! - Track selection -> file-ref cache -> (miss) fetch + transcode ->
//!   upload -> cache the returned file_id for future resends
//!
//! The dispatch loop stays responsive: fetches run on a bounded worker
//! pool and each selection's orchestration is spawned as its own task.
//!
//! # Modules
//!
//! - `adapters`: External system integrations (YouTube, yt-dlp, Telegram)
//! - `cache`: Shared in-memory stores (search results, durable file refs)
//! - `core`: Search service, result assembly, playback, dispatch loop
//! - `domain`: Data structures (TrackId, TrackHit, PreparedAudio)
//! - `cli`: Command-line interface

pub mod adapters;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod text;

// Re-export main types at crate root for convenience
pub use cache::{FileRefCache, SearchCache};
pub use core::{Bot, PlaybackOrchestrator, SearchService};
pub use domain::{FileRef, PlaybackOutcome, PlaybackRequest, PreparedAudio, TrackHit, TrackId};
