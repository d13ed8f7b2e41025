//! TTL cache for search results.
//!
//! Maps a normalized query string to the ordered hits a previous provider
//! call returned. An entry is servable while it is younger than the TTL;
//! past that it behaves as a miss. Stale entries are evicted
//! opportunistically on the next write.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::domain::TrackHit;

/// Default time-to-live for a cached result set.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CachedHits {
    hits: Vec<TrackHit>,
    created: Instant,
}

/// Concurrency-safe query -> results cache with a fixed TTL.
pub struct SearchCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedHits>>,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached hits for a query while they are still fresh.
    pub async fn get(&self, query: &str) -> Option<Vec<TrackHit>> {
        let entries = self.entries.read().await;
        let entry = entries.get(query)?;
        if entry.created.elapsed() < self.ttl {
            Some(entry.hits.clone())
        } else {
            None
        }
    }

    /// Store results for a query, superseding any previous set.
    pub async fn put(&self, query: &str, hits: Vec<TrackHit>) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.created.elapsed() < self.ttl);
        entries.insert(
            query.to_string(),
            CachedHits {
                hits,
                created: Instant::now(),
            },
        );
    }

    /// Number of entries currently held, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
