use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;

use crate::domain::{ChannelInfo, RawMessage, ScraperOptions};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
    #[error(transparent)]
    Api(#[from] anyhow::Error),
}

/// One page worth of fetch parameters. Date windows are deliberately
/// absent: filtering by date stays client-side in the fetcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
    pub limit: usize,
    /// Only messages with id below this are returned (0 = no bound).
    pub offset_id: i64,
    /// Exclusive lower id bound (0 = no bound).
    pub min_id: i64,
    /// Exclusive upper id bound (0 = no bound).
    pub max_id: i64,
}

impl From<&ScraperOptions> for PageRequest {
    fn from(options: &ScraperOptions) -> Self {
        Self {
            limit: options.limit,
            offset_id: options.offset_id,
            min_id: options.min_id,
            max_id: options.max_id,
        }
    }
}

impl PageRequest {
    pub fn admits(&self, id: i64) -> bool {
        if self.offset_id > 0 && id >= self.offset_id {
            return false;
        }
        if self.min_id > 0 && id <= self.min_id {
            return false;
        }
        if self.max_id > 0 && id >= self.max_id {
            return false;
        }
        true
    }
}

/// Port to the messaging service. The scraper core only ever talks to this
/// trait; network and protocol details live behind it.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Resolve a channel identifier to its entity. Fails fast when the
    /// name does not resolve.
    async fn resolve_channel(&self, name: &str) -> Result<ChannelInfo, TransportError>;

    /// Fetch up to `page.limit` raw messages in the transport's own order.
    async fn fetch_page(
        &self,
        channel: &ChannelInfo,
        page: &PageRequest,
    ) -> Result<Vec<RawMessage>, TransportError>;

    /// Standing subscription to new raw messages. The stream is the
    /// deregistration handle: dropping it tears the listener down. Events
    /// are not pre-filtered by channel; callers filter on `channel_id`.
    fn subscribe(&self, channel: &ChannelInfo) -> BoxStream<'static, RawMessage>;
}

/// In-memory transport for tests. Holds a fixed channel registry, a page
/// of history and a replayable event feed; no network required.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    channels: Vec<ChannelInfo>,
    history: Vec<RawMessage>,
    events: Vec<RawMessage>,
}

impl MemoryTransport {
    pub fn new(channels: Vec<ChannelInfo>) -> Self {
        Self {
            channels,
            history: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<RawMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_events(mut self, events: Vec<RawMessage>) -> Self {
        self.events = events;
        self
    }
}

#[async_trait]
impl ChannelTransport for MemoryTransport {
    async fn resolve_channel(&self, name: &str) -> Result<ChannelInfo, TransportError> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| TransportError::ChannelNotFound(name.to_string()))
    }

    async fn fetch_page(
        &self,
        channel: &ChannelInfo,
        page: &PageRequest,
    ) -> Result<Vec<RawMessage>, TransportError> {
        Ok(self
            .history
            .iter()
            .filter(|m| m.channel_id == channel.id && page.admits(m.id))
            .take(page.limit)
            .cloned()
            .collect())
    }

    fn subscribe(&self, _channel: &ChannelInfo) -> BoxStream<'static, RawMessage> {
        stream::iter(self.events.clone()).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawMedia;

    fn channel() -> ChannelInfo {
        ChannelInfo {
            id: 77,
            name: "foo".into(),
            title: Some("Foo".into()),
        }
    }

    fn raw(id: i64) -> RawMessage {
        RawMessage {
            id,
            channel_id: 77,
            date: 1_700_000_000,
            text: format!("message {id}"),
            views: None,
            media: RawMedia::None,
        }
    }

    #[tokio::test]
    async fn resolve_unknown_channel_fails() {
        let transport = MemoryTransport::new(vec![channel()]);
        let err = transport.resolve_channel("bar").await.unwrap_err();
        assert!(matches!(err, TransportError::ChannelNotFound(name) if name == "bar"));
    }

    #[tokio::test]
    async fn fetch_page_honors_id_window_and_limit() {
        let transport = MemoryTransport::new(vec![channel()])
            .with_history((1..=20).map(raw).collect());
        let ch = transport.resolve_channel("foo").await.unwrap();

        let page = PageRequest {
            limit: 5,
            offset_id: 0,
            min_id: 3,
            max_id: 18,
        };
        let messages = transport.fetch_page(&ch, &page).await.unwrap();
        let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![4, 5, 6, 7, 8]);
    }

    #[tokio::test]
    async fn fetch_page_offset_id_is_exclusive_upper_bound() {
        let transport = MemoryTransport::new(vec![channel()])
            .with_history((1..=10).map(raw).collect());
        let ch = transport.resolve_channel("foo").await.unwrap();

        let page = PageRequest {
            limit: 100,
            offset_id: 4,
            ..PageRequest::default()
        };
        let messages = transport.fetch_page(&ch, &page).await.unwrap();
        let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
