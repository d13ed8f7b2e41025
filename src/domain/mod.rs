//! Data structures shared across the bot.

pub mod playback;
pub mod track;

pub use playback::{PlaybackOutcome, PlaybackRequest, PlaybackState};
pub use track::{FileRef, PreparedAudio, TrackHit, TrackId};
