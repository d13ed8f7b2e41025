//! YouTube Data API search client.
//!
//! Normalizes the provider's `search.list` response into track hits.
//! Items with missing fields are skipped rather than failing the batch;
//! provider trouble surfaces as a typed error the caller recovers from.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::TrackSearcher;
use crate::domain::{TrackHit, TrackId};

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

/// Errors from the search provider. All of them are recoverable at the
/// dispatch level; the user sees an empty answer.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search provider returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed search payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Search client with a bounded request timeout.
pub struct YouTubeSearch {
    api_key: String,
    max_results: u8,
    client: reqwest::Client,
}

impl YouTubeSearch {
    pub fn new(api_key: String, max_results: u8, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            max_results,
            client,
        })
    }
}

#[async_trait]
impl TrackSearcher for YouTubeSearch {
    async fn search(&self, query: &str) -> Result<Vec<TrackHit>, SearchError> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", &self.max_results.to_string()),
                ("q", query),
                ("key", &self.api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status));
        }

        let payload = response.text().await?;
        let hits = parse_hits(&payload)?;
        debug!(count = hits.len(), "Search provider returned");
        Ok(hits)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: Option<ItemId>,
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: Option<String>,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    #[serde(rename = "default")]
    fallback: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Parse the provider payload into hits, skipping malformed items.
pub fn parse_hits(payload: &str) -> Result<Vec<TrackHit>, serde_json::Error> {
    let response: SearchResponse = serde_json::from_str(payload)?;
    Ok(response.items.into_iter().filter_map(hit_from_item).collect())
}

fn hit_from_item(item: SearchItem) -> Option<TrackHit> {
    let id = item.id?.video_id?;
    let snippet = item.snippet?;
    let thumbnail_url = snippet
        .thumbnails
        .medium
        .or(snippet.thumbnails.fallback)
        .map(|t| t.url)
        .unwrap_or_default();

    Some(TrackHit {
        id: TrackId::new(id),
        title: snippet.title?,
        channel: snippet.channel_title?,
        thumbnail_url,
    })
}
