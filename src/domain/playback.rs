//! Playback orchestration states and outcomes.

use super::TrackId;

/// States one selection moves through, in order. `FailedResend` loops
/// back into `Fetching`; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Pending,
    Publishing,
    FailedResend,
    Fetching,
    Caching,
    Cleanup,
    Done,
    Failed,
}

/// A selection event extracted from a `dl|<id>` callback.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    /// Track the user selected
    pub track: TrackId,

    /// Chat to deliver the audio to
    pub chat_id: i64,

    /// Status message to edit with progress text, if any
    pub status_message_id: Option<i64>,

    /// User's language code
    pub lang: String,
}

/// Terminal result of one orchestration. No retry is performed; a retry
/// is a fresh user selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Artifact delivered from a fresh fetch and cached for resends
    Delivered,

    /// Artifact resent from the durable-reference cache, no fetch
    Resent,

    /// Terminal failure; the user is informed
    Failed(String),
}
