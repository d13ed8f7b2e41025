//! Adapter interfaces for external systems.
//!
//! Each collaborator (search provider, fetch-and-transcode pipeline,
//! messaging host) is reached through a trait so orchestration logic can
//! be exercised against substitutes.

pub mod telegram;
pub mod youtube;
pub mod ytdlp;

use std::sync::Arc;

use async_trait::async_trait;

pub use telegram::{PublishError, TelegramApi};
pub use youtube::{SearchError, YouTubeSearch};
pub use ytdlp::{FetchError, FetcherConfig, YtDlpFetcher};

use crate::domain::{FileRef, PreparedAudio, TrackHit, TrackId};

/// Keyword search against the media provider.
#[async_trait]
pub trait TrackSearcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<TrackHit>, SearchError>;
}

/// Blocking fetch-and-transcode, executed off the dispatch loop.
///
/// The caller owns disposal of the returned artifact.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn prepare(&self, track: &TrackId) -> Result<PreparedAudio, FetchError>;
}

/// Audio delivery through the messaging host.
#[async_trait]
pub trait AudioPublisher: Send + Sync {
    /// Upload a local artifact; returns the durable reference reusable
    /// for future resends.
    async fn publish_file(
        &self,
        chat_id: i64,
        audio: &PreparedAudio,
    ) -> Result<FileRef, PublishError>;

    /// Resend a previously uploaded artifact by reference.
    async fn publish_ref(&self, chat_id: i64, file_ref: &FileRef) -> Result<(), PublishError>;
}

#[async_trait]
impl<S: TrackSearcher + ?Sized> TrackSearcher for Arc<S> {
    async fn search(&self, query: &str) -> Result<Vec<TrackHit>, SearchError> {
        (**self).search(query).await
    }
}

#[async_trait]
impl<F: AudioFetcher + ?Sized> AudioFetcher for Arc<F> {
    async fn prepare(&self, track: &TrackId) -> Result<PreparedAudio, FetchError> {
        (**self).prepare(track).await
    }
}

#[async_trait]
impl<P: AudioPublisher + ?Sized> AudioPublisher for Arc<P> {
    async fn publish_file(
        &self,
        chat_id: i64,
        audio: &PreparedAudio,
    ) -> Result<FileRef, PublishError> {
        (**self).publish_file(chat_id, audio).await
    }

    async fn publish_ref(&self, chat_id: i64, file_ref: &FileRef) -> Result<(), PublishError> {
        (**self).publish_ref(chat_id, file_ref).await
    }
}
