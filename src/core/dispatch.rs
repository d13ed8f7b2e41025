//! Long-polling update dispatcher.
//!
//! One logical event loop: inline queries are answered in place (cache
//! hit or one bounded provider call); selections are spawned onto the
//! runtime so the loop never waits on a fetch. Handler failures are
//! logged, never fatal to the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::adapters::telegram::{CallbackQuery, InlineQuery, Message, TelegramApi, Update};
use crate::adapters::{YouTubeSearch, YtDlpFetcher};
use crate::cache::{FileRefCache, SearchCache};
use crate::config::Settings;
use crate::core::assemble::{assemble, parse_callback};
use crate::core::playback::PlaybackOrchestrator;
use crate::core::search::{normalize_query, SearchService};
use crate::domain::{PlaybackOutcome, PlaybackRequest};
use crate::text::{t, Key};

const POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Host-side cache hint for answered inline queries, seconds
const ANSWER_CACHE_SECS: u32 = 300;

const HELP_TEXT: &str = "🎵 Inline music bot\n\n\
    🔍 Search anywhere: @<bot> song name\n\
    ⬇ Download & Play delivers the audio in chat\n\n\
    ⚡ Fast • Cached • Multilingual";

/// The bot: shared caches, adapters, and the dispatch loop.
pub struct Bot {
    telegram: Arc<TelegramApi>,
    search: SearchService<YouTubeSearch>,
    playback: PlaybackOrchestrator<YtDlpFetcher, Arc<TelegramApi>>,
    enabled: AtomicBool,
    owner_id: i64,
    started_at: DateTime<Utc>,
}

impl Bot {
    pub fn new(settings: Settings) -> Result<Self> {
        let telegram = Arc::new(TelegramApi::new(settings.bot_token.clone()));

        let search_cache = Arc::new(SearchCache::new(settings.result_ttl));
        let searcher = YouTubeSearch::new(
            settings.api_key.clone(),
            settings.search.max_results,
            settings.search.timeout,
        )?;

        let file_refs = Arc::new(FileRefCache::new(settings.file_ref_capacity));
        let fetcher = YtDlpFetcher::new(settings.fetcher.clone());

        Ok(Self {
            playback: PlaybackOrchestrator::new(fetcher, telegram.clone(), file_refs),
            search: SearchService::new(search_cache, searcher),
            telegram,
            enabled: AtomicBool::new(true),
            owner_id: settings.owner_id,
            started_at: Utc::now(),
        })
    }

    /// Run the long-poll dispatch loop until the process is stopped.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        info!("Bot dispatch loop running");
        let mut offset = 0i64;

        loop {
            let updates = match self.telegram.get_updates(offset, POLL_TIMEOUT).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "Polling failed, backing off");
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.clone().route(update).await;
            }
        }
    }

    async fn route(self: Arc<Self>, update: Update) {
        if let Some(query) = update.inline_query {
            if let Err(e) = self.handle_inline_query(&query).await {
                warn!(error = %e, "Inline query handler failed");
            }
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
        } else if let Some(message) = update.message {
            if let Err(e) = self.handle_command(&message).await {
                warn!(error = %e, "Command handler failed");
            }
        }
    }

    async fn handle_inline_query(&self, query: &InlineQuery) -> Result<()> {
        if !self.enabled.load(Ordering::Relaxed) {
            return Ok(());
        }
        let Some(normalized) = normalize_query(&query.query) else {
            return Ok(());
        };
        let lang = query.from.language_code.as_deref().unwrap_or("en");

        let hits = match self.search.search(normalized).await {
            Ok(hits) => hits,
            Err(e) => {
                // Degrade to an empty answer; the loop survives provider trouble.
                warn!(error = %e, query = normalized, "Search provider failed");
                Vec::new()
            }
        };

        let results: Vec<_> = hits.iter().map(|hit| assemble(hit, lang)).collect();
        self.telegram
            .answer_inline_query(&query.id, &results, ANSWER_CACHE_SECS)
            .await?;
        Ok(())
    }

    async fn handle_callback(self: Arc<Self>, callback: CallbackQuery) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let Some(track) = callback.data.as_deref().and_then(parse_callback) else {
            debug!("Ignoring unrecognized callback payload");
            return;
        };

        // Ack immediately so the client stops its spinner.
        if let Err(e) = self.telegram.answer_callback_query(&callback.id).await {
            debug!(error = %e, "Callback ack failed");
        }

        let Some(message) = callback.message else {
            warn!(%track, "Selection without an originating chat, dropping");
            return;
        };

        let request = PlaybackRequest {
            track,
            chat_id: message.chat.id,
            status_message_id: Some(message.message_id),
            lang: callback
                .from
                .language_code
                .unwrap_or_else(|| "en".to_string()),
        };

        if let Err(e) = self
            .telegram
            .edit_message_text(
                request.chat_id,
                message.message_id,
                t(&request.lang, Key::Downloading),
            )
            .await
        {
            debug!(error = %e, "Status edit failed");
        }

        // The fetch never runs on the dispatch loop.
        tokio::spawn(async move {
            let outcome = self.playback.handle(&request).await;
            if let PlaybackOutcome::Failed(reason) = outcome {
                error!(track = %request.track, %reason, "Selection failed");
                if let Some(message_id) = request.status_message_id {
                    if let Err(e) = self
                        .telegram
                        .edit_message_text(
                            request.chat_id,
                            message_id,
                            t(&request.lang, Key::DownloadFailed),
                        )
                        .await
                    {
                        debug!(error = %e, "Failure notice edit failed");
                    }
                }
            }
        });
    }

    async fn handle_command(&self, message: &Message) -> Result<()> {
        let Some(command) = message.text.as_deref().and_then(command_name) else {
            return Ok(());
        };

        match command {
            "/help" => {
                self.telegram.send_message(message.chat.id, HELP_TEXT).await?;
            }
            "/start" | "/stop" | "/status" => {
                if message.from.as_ref().map(|u| u.id) != Some(self.owner_id) {
                    return Ok(());
                }
                match command {
                    "/start" => {
                        self.enabled.store(true, Ordering::Relaxed);
                        self.telegram
                            .send_message(message.chat.id, "✅ Bot started.")
                            .await?;
                    }
                    "/stop" => {
                        self.enabled.store(false, Ordering::Relaxed);
                        self.telegram
                            .send_message(message.chat.id, "⛔ Bot stopped.")
                            .await?;
                    }
                    _ => {
                        let state = if self.enabled.load(Ordering::Relaxed) {
                            "ON ✅"
                        } else {
                            "OFF ⛔"
                        };
                        let text = format!(
                            "🤖 Bot status: {}\nUp since {}",
                            state,
                            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        );
                        self.telegram.send_message(message.chat.id, &text).await?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Extract the command name from a message, stripping arguments and any
/// `@botname` suffix. Returns `None` for non-command text.
fn command_name(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    Some(first.split('@').next().unwrap_or(first))
}
