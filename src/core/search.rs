//! Query flow: cache first, provider on a miss.

use std::sync::Arc;

use tracing::debug;

use crate::adapters::{SearchError, TrackSearcher};
use crate::cache::SearchCache;
use crate::domain::TrackHit;

/// Normalize a raw inline query. Returns `None` when nothing remains.
pub fn normalize_query(raw: &str) -> Option<&str> {
    let query = raw.trim();
    (!query.is_empty()).then_some(query)
}

/// Answers queries from the cache, falling back to the provider and
/// caching what it returns.
pub struct SearchService<S> {
    cache: Arc<SearchCache>,
    searcher: S,
}

impl<S: TrackSearcher> SearchService<S> {
    pub fn new(cache: Arc<SearchCache>, searcher: S) -> Self {
        Self { cache, searcher }
    }

    /// Resolve a normalized query, consulting the provider only on a
    /// cache miss.
    ///
    /// Provider failures are returned as errors and leave the cache
    /// untouched, so the caller can tell "no results" from "provider
    /// down".
    pub async fn search(&self, query: &str) -> Result<Vec<TrackHit>, SearchError> {
        if let Some(hits) = self.cache.get(query).await {
            debug!(%query, "Search cache hit");
            return Ok(hits);
        }

        let hits = self.searcher.search(query).await?;
        self.cache.put(query, hits.clone()).await;
        Ok(hits)
    }
}
