use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;

use crate::{
    config::{AppConfig, RunMode},
    domain::{MessageBatch, MessageData, ScraperOptions},
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    scraper::{BatchFetcher, LiveBatcher},
    storage::FileStorage,
    telegram::BotApiTransport,
    transport::ChannelTransport,
};

pub struct ScraperApp {
    config: Arc<AppConfig>,
    storage: Arc<FileStorage>,
    transport: Arc<dyn ChannelTransport>,
    shutdown: Shutdown,
}

impl ScraperApp {
    pub fn initialize(config: AppConfig, paths: ResolvedPaths, shutdown: Shutdown) -> Result<Self> {
        let config = Arc::new(config);
        let storage = Arc::new(FileStorage::new(&paths.data_dir)?);
        let bot = Bot::new(&config.telegram_bot_token);
        let transport: Arc<dyn ChannelTransport> = Arc::new(BotApiTransport::new(bot));
        Ok(Self {
            config,
            storage,
            transport,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        match self.config.mode {
            RunMode::Once => self.run_once().await,
            RunMode::Live => self.run_live().await,
        }
    }

    /// Fetch one batch, save it, optionally hand it to a host process via
    /// OUTPUT_FILE, exit.
    async fn run_once(&self) -> Result<()> {
        tracing::info!(channel = %self.config.target_channel, "starting single-shot scrape");

        let batch = self.fetch_batch().await?;
        log_statistics(&batch.messages);

        let prefix = format!("{}_direct", self.config.target_channel);
        let saved = self.storage.save(&batch.messages, &prefix)?;
        tracing::info!(path = %saved.display(), "batch saved");

        if let Some(output_file) = &self.config.output_file {
            let body = serde_json::to_vec(&batch.messages)
                .context("failed to serialize batch for host process")?;
            std::fs::write(output_file, body)
                .with_context(|| format!("failed to write {}", output_file.display()))?;
            tracing::info!(path = %output_file.display(), "output file written");
        }

        tracing::info!("scrape completed");
        Ok(())
    }

    /// Fetch and save an initial batch, then stream new messages until
    /// Ctrl-C / SIGTERM.
    async fn run_live(&self) -> Result<()> {
        tracing::info!(channel = %self.config.target_channel, "starting live scraper");

        let initial = self.fetch_batch().await?;
        log_statistics(&initial.messages);
        let prefix = format!("{}_initial", self.config.target_channel);
        self.storage.save(&initial.messages, &prefix)?;

        let channel = self
            .transport
            .resolve_channel(&self.config.target_channel)
            .await?;
        let batcher = LiveBatcher::new(
            self.storage.clone(),
            format!("{}_live", self.config.target_channel),
            self.config.live.flush_threshold,
            self.config.live.flush_interval,
        );

        let mut listener = self.shutdown.subscribe();
        batcher
            .run(self.transport.as_ref(), &channel, &mut listener)
            .await
    }

    async fn fetch_batch(&self) -> Result<MessageBatch> {
        let fetcher = BatchFetcher::new(self.transport.clone(), self.config.target_channel.clone());
        let options = ScraperOptions {
            limit: self.config.fetch.limit,
            ..ScraperOptions::default()
        };
        fetcher.fetch(&options).await
    }
}

#[derive(Debug, PartialEq)]
struct BatchStats {
    total: usize,
    with_text: usize,
    with_photos: usize,
    with_videos: usize,
    without_content: usize,
}

fn compute_stats(messages: &[MessageData]) -> BatchStats {
    BatchStats {
        total: messages.len(),
        with_text: messages
            .iter()
            .filter(|m| !m.message_text.trim().is_empty())
            .count(),
        with_photos: messages
            .iter()
            .filter(|m| !m.message_photo.is_empty())
            .count(),
        with_videos: messages
            .iter()
            .filter(|m| !m.message_video.is_empty())
            .count(),
        without_content: messages
            .iter()
            .filter(|m| {
                m.message_text.trim().is_empty()
                    && m.message_photo.is_empty()
                    && m.message_video.is_empty()
            })
            .count(),
    }
}

fn log_statistics(messages: &[MessageData]) {
    let stats = compute_stats(messages);
    if stats.total == 0 {
        tracing::info!(target: "stats", "no messages found");
        return;
    }

    tracing::info!(
        target: "stats",
        total = stats.total,
        with_text = stats.with_text,
        with_photos = stats.with_photos,
        with_videos = stats.with_videos,
        without_content = stats.without_content,
        text_pct = stats.with_text * 100 / stats.total,
        "message statistics"
    );

    for (index, message) in messages
        .iter()
        .filter(|m| !m.message_text.trim().is_empty())
        .take(3)
        .enumerate()
    {
        tracing::info!(
            target: "stats",
            sample = index + 1,
            text = %preview(&message.message_text, 70),
            "sample message"
        );
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}
