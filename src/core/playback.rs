//! Playback orchestration for track selections.
//!
//! One selection runs the state machine: resend from the durable
//! reference cache when possible, otherwise fetch and transcode, upload,
//! cache the returned reference, and release the scratch artifact. A
//! per-track gate ensures concurrent selections of the same uncached
//! track perform a single fetch.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::adapters::{AudioFetcher, AudioPublisher};
use crate::cache::FileRefCache;
use crate::domain::{PlaybackOutcome, PlaybackRequest, PlaybackState, TrackId};

/// Per-track in-flight gate.
///
/// The winning caller holds the per-key lock across fetch, upload, and
/// cache write; a concurrent caller for the same track waits here and
/// then finds the reference cache populated.
#[derive(Default)]
struct FetchGate {
    locks: Mutex<HashMap<TrackId, Arc<Mutex<()>>>>,
}

impl FetchGate {
    async fn lock_for(&self, track: &TrackId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(track.clone()).or_default().clone()
    }

    /// Drop the map entry once the winning caller is done. Waiters that
    /// already cloned the lock still serialize among themselves.
    async fn release(&self, track: &TrackId) {
        self.locks.lock().await.remove(track);
    }
}

/// Drives one selection from cache check through cleanup.
pub struct PlaybackOrchestrator<F, P> {
    fetcher: F,
    publisher: P,
    file_refs: Arc<FileRefCache>,
    gate: FetchGate,
}

impl<F: AudioFetcher, P: AudioPublisher> PlaybackOrchestrator<F, P> {
    pub fn new(fetcher: F, publisher: P, file_refs: Arc<FileRefCache>) -> Self {
        Self {
            fetcher,
            publisher,
            file_refs,
            gate: FetchGate::default(),
        }
    }

    /// Run one selection to a terminal state. Never retries; a retry is
    /// a fresh selection.
    #[instrument(skip(self, request), fields(track = %request.track, chat = request.chat_id))]
    pub async fn handle(&self, request: &PlaybackRequest) -> PlaybackOutcome {
        let mut state = PlaybackState::Pending;
        debug!(?state, "Selection accepted");

        let _guard = self.gate.lock_for(&request.track).await.lock_owned().await;

        // Durable reference on hand: resend without fetching.
        if let Some(file_ref) = self.file_refs.get(&request.track).await {
            state = PlaybackState::Publishing;
            debug!(?state, "Resending from cached reference");
            match self.publisher.publish_ref(request.chat_id, &file_ref).await {
                Ok(()) => {
                    self.gate.release(&request.track).await;
                    state = PlaybackState::Done;
                    info!(?state, "Resent from cached reference");
                    return PlaybackOutcome::Resent;
                }
                Err(e) => {
                    // Host-side references can go stale; fall through to
                    // a fresh fetch instead of surfacing an error.
                    state = PlaybackState::FailedResend;
                    warn!(?state, error = %e, "Cached reference rejected, refetching");
                }
            }
        }

        state = PlaybackState::Fetching;
        debug!(?state, "Fetching and transcoding");
        let audio = match self.fetcher.prepare(&request.track).await {
            Ok(audio) => audio,
            Err(e) => {
                self.gate.release(&request.track).await;
                state = PlaybackState::Failed;
                warn!(?state, error = %e, "Fetch failed, selection terminated");
                return PlaybackOutcome::Failed(e.to_string());
            }
        };

        state = PlaybackState::Publishing;
        debug!(?state, "Uploading artifact");
        let outcome = match self.publisher.publish_file(request.chat_id, &audio).await {
            Ok(file_ref) => {
                state = PlaybackState::Caching;
                debug!(?state, "Storing durable reference");
                self.file_refs.put(request.track.clone(), file_ref).await;
                PlaybackOutcome::Delivered
            }
            Err(e) => {
                warn!(error = %e, "Upload failed after fetch");
                PlaybackOutcome::Failed(e.to_string())
            }
        };

        // Runs whether the upload and cache write succeeded or not; no
        // local artifact outlives the orchestration.
        state = PlaybackState::Cleanup;
        debug!(?state, "Releasing scratch artifact");
        audio.dispose();
        self.gate.release(&request.track).await;

        state = match outcome {
            PlaybackOutcome::Failed(_) => PlaybackState::Failed,
            _ => PlaybackState::Done,
        };
        match &outcome {
            PlaybackOutcome::Delivered => info!(?state, "Delivered and cached"),
            PlaybackOutcome::Failed(reason) => warn!(?state, %reason, "Selection failed"),
            PlaybackOutcome::Resent => {}
        }
        outcome
    }
}
