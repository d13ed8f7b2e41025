//! Durable file-reference cache.
//!
//! Maps a track id to the file reference returned by its first upload so
//! later selections resend without fetching. Entries never expire by age;
//! the store is a bounded LRU so a long-lived process cannot grow without
//! limit. Writes to the same key are last-write-wins.

use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;

use crate::domain::{FileRef, TrackId};

/// Default capacity of the reference cache.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Concurrency-safe track -> durable reference store.
pub struct FileRefCache {
    entries: Mutex<LruCache<TrackId, FileRef>>,
}

impl FileRefCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn get(&self, track: &TrackId) -> Option<FileRef> {
        self.entries.lock().await.get(track).cloned()
    }

    pub async fn put(&self, track: TrackId, file_ref: FileRef) {
        self.entries.lock().await.put(track, file_ref);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for FileRefCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = FileRefCache::default();
        let track = TrackId::new("abc123");

        cache.put(track.clone(), FileRef::new("file-1")).await;

        assert_eq!(cache.get(&track).await, Some(FileRef::new("file-1")));
    }

    #[tokio::test]
    async fn test_unknown_track_is_a_miss() {
        let cache = FileRefCache::default();
        assert_eq!(cache.get(&TrackId::new("nope")).await, None);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let cache = FileRefCache::default();
        let track = TrackId::new("abc123");

        cache.put(track.clone(), FileRef::new("old")).await;
        cache.put(track.clone(), FileRef::new("new")).await;

        assert_eq!(cache.get(&track).await, Some(FileRef::new("new")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = FileRefCache::new(2);
        cache.put(TrackId::new("a"), FileRef::new("ref-a")).await;
        cache.put(TrackId::new("b"), FileRef::new("ref-b")).await;

        // Touch "a" so "b" becomes the eviction candidate
        cache.get(&TrackId::new("a")).await;
        cache.put(TrackId::new("c"), FileRef::new("ref-c")).await;

        assert!(cache.get(&TrackId::new("a")).await.is_some());
        assert!(cache.get(&TrackId::new("b")).await.is_none());
        assert!(cache.get(&TrackId::new("c")).await.is_some());
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped() {
        let cache = FileRefCache::new(0);
        cache.put(TrackId::new("a"), FileRef::new("ref-a")).await;
        assert_eq!(cache.len().await, 1);
    }
}
