//! Command-line interface for jukebox.
//!
//! `run` starts the bot; the remaining commands are one-shot tools for
//! poking at the search and fetch pipelines without a Telegram round
//! trip.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::adapters::{AudioFetcher, TrackSearcher, YouTubeSearch, YtDlpFetcher};
use crate::config::Settings;
use crate::core::Bot;
use crate::domain::TrackId;

/// jukebox - inline music search and delivery bot
#[derive(Parser, Debug)]
#[command(name = "jukebox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bot dispatch loop (default)
    Run,

    /// One-shot provider search
    Search {
        /// Free-text query
        query: String,
    },

    /// One-shot fetch-and-transcode for a track id
    Fetch {
        /// Track id (YouTube video id)
        id: String,

        /// Keep the transcoded file instead of removing it
        #[arg(long)]
        keep: bool,
    },

    /// Verify the yt-dlp binary is callable
    Health,

    /// Show resolved configuration (secrets redacted)
    Config,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load()?;

        match self.command.unwrap_or(Commands::Run) {
            Commands::Run => {
                let bot = Arc::new(Bot::new(settings)?);
                bot.run().await
            }

            Commands::Search { query } => {
                let searcher = YouTubeSearch::new(
                    settings.api_key.clone(),
                    settings.search.max_results,
                    settings.search.timeout,
                )?;

                let hits = searcher.search(&query).await?;
                if hits.is_empty() {
                    println!("No results.");
                }
                for hit in hits {
                    println!("{}  {} — {}", hit.id, hit.title, hit.channel);
                }
                Ok(())
            }

            Commands::Fetch { id, keep } => {
                let fetcher = YtDlpFetcher::new(settings.fetcher.clone());
                let audio = fetcher.prepare(&TrackId::new(id)).await?;

                println!("title:     {}", audio.title);
                if let Some(ref performer) = audio.performer {
                    println!("performer: {}", performer);
                }
                if let Some(duration) = audio.duration_secs {
                    println!("duration:  {}s", duration);
                }
                println!("file:      {}", audio.path.display());

                if keep {
                    let path = audio.keep();
                    println!("kept at:   {}", path.display());
                } else {
                    audio.dispose();
                }
                Ok(())
            }

            Commands::Health => {
                let fetcher = YtDlpFetcher::new(settings.fetcher.clone());
                let version = fetcher.health_check().await?;
                println!("yt-dlp {}", version);
                Ok(())
            }

            Commands::Config => {
                println!("{}", settings.redacted());
                Ok(())
            }
        }
    }
}
