//! Orchestration logic: search service, result assembly, playback, and
//! the update dispatch loop.

pub mod assemble;
pub mod dispatch;
pub mod playback;
pub mod search;

pub use assemble::{assemble, parse_callback};
pub use dispatch::Bot;
pub use playback::PlaybackOrchestrator;
pub use search::{normalize_query, SearchService};
