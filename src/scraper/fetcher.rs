use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::{
    domain::{MessageBatch, MessageData, ScraperOptions},
    scraper::normalizer::normalize,
    transport::{ChannelTransport, PageRequest},
};

/// Paginated history fetch for one channel. Resolution errors propagate;
/// per-message processing never fails (the normalizer is total), so every
/// raw message yields a record before the date filter runs.
pub struct BatchFetcher {
    transport: Arc<dyn ChannelTransport>,
    channel_name: String,
}

impl BatchFetcher {
    pub fn new(transport: Arc<dyn ChannelTransport>, channel_name: impl Into<String>) -> Self {
        Self {
            transport,
            channel_name: channel_name.into(),
        }
    }

    pub async fn fetch(&self, options: &ScraperOptions) -> Result<MessageBatch> {
        tracing::info!(
            target: "fetcher",
            channel = %self.channel_name,
            limit = options.limit,
            "fetching messages"
        );

        let channel = self
            .transport
            .resolve_channel(&self.channel_name)
            .await
            .with_context(|| format!("could not resolve channel {}", self.channel_name))?;

        let page = PageRequest::from(options);
        let raw_messages = self
            .transport
            .fetch_page(&channel, &page)
            .await
            .with_context(|| format!("failed to fetch messages from {}", self.channel_name))?;

        let fetched = raw_messages.len();
        let mut messages: Vec<MessageData> = raw_messages
            .iter()
            .map(|raw| normalize(raw, &channel))
            .collect();
        messages.retain(|record| within_window(record, options.from_date, options.to_date));

        tracing::info!(
            target: "fetcher",
            channel = %self.channel_name,
            fetched,
            kept = messages.len(),
            "batch assembled"
        );

        let total_count = messages.len();
        Ok(MessageBatch {
            channel_name: self.channel_name.clone(),
            messages,
            total_count,
            batch_timestamp: Utc::now(),
        })
    }
}

/// Inclusive date window on the derived datetime. Records whose datetime
/// does not parse pass unconditionally.
fn within_window(
    record: &MessageData,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    let Some(datetime) = DateTime::parse_from_rfc3339(&record.datetime)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
    else {
        return true;
    };
    if from.is_some_and(|from| datetime < from) {
        return false;
    }
    if to.is_some_and(|to| datetime > to) {
        return false;
    }
    true
}
