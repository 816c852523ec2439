use std::{sync::Arc, time::Duration};

use anyhow::Result;
use futures::StreamExt;
use parking_lot::Mutex;

use crate::{
    domain::{ChannelInfo, MessageData, RawMessage},
    infrastructure::shutdown::ShutdownListener,
    scraper::normalizer::normalize,
    storage::FileStorage,
    transport::ChannelTransport,
};

/// Accumulates normalized live messages and flushes them to storage when
/// the buffer reaches a count threshold or the periodic timer fires.
/// The buffer is drained under the same lock that guards appends, so a
/// flush is atomic with respect to events arriving mid-drain.
pub struct LiveBatcher {
    storage: Arc<FileStorage>,
    file_prefix: String,
    flush_threshold: usize,
    flush_interval: Duration,
    buffer: Mutex<Vec<MessageData>>,
}

impl LiveBatcher {
    pub fn new(
        storage: Arc<FileStorage>,
        file_prefix: impl Into<String>,
        flush_threshold: usize,
        flush_interval: Duration,
    ) -> Self {
        Self {
            storage,
            file_prefix: file_prefix.into(),
            flush_threshold: flush_threshold.max(1),
            flush_interval,
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// Consume the transport's subscription until shutdown or stream end.
    /// Events are handled one at a time in arrival order.
    pub async fn run(
        &self,
        transport: &dyn ChannelTransport,
        channel: &ChannelInfo,
        shutdown: &mut ShutdownListener,
    ) -> Result<()> {
        tracing::info!(
            target: "live",
            channel = %channel.name,
            threshold = self.flush_threshold,
            interval_secs = self.flush_interval.as_secs(),
            "listening for new messages"
        );

        let mut stream = transport.subscribe(channel);
        let mut ticker = tokio::time::interval(self.flush_interval);

        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    self.flush("shutdown");
                    break;
                }
                _ = ticker.tick() => {
                    self.flush("interval");
                }
                event = stream.next() => match event {
                    Some(raw) => self.handle_event(&raw, channel),
                    None => {
                        tracing::warn!(target: "live", "update stream ended");
                        self.flush("stream-end");
                        break;
                    }
                },
            }
        }

        tracing::info!(target: "live", "listener stopped");
        Ok(())
    }

    fn handle_event(&self, raw: &RawMessage, channel: &ChannelInfo) {
        // Not a failure: the subscription carries every chat the account
        // sees, only the target channel is ours.
        if raw.channel_id != channel.id {
            return;
        }
        let record = normalize(raw, channel);
        tracing::info!(
            target: "live",
            message_id = raw.id,
            channel = %channel.name,
            "new message received"
        );
        self.push(record);
    }

    /// Append one record; drain and persist when the threshold is reached.
    pub fn push(&self, record: MessageData) {
        let drained = {
            let mut buffer = self.buffer.lock();
            buffer.push(record);
            if buffer.len() >= self.flush_threshold {
                Some(std::mem::take(&mut *buffer))
            } else {
                None
            }
        };
        if let Some(records) = drained {
            self.save(records, "threshold");
        }
    }

    /// Drain whatever is buffered and persist it. No-op when empty.
    pub fn flush(&self, reason: &str) {
        let drained = std::mem::take(&mut *self.buffer.lock());
        if !drained.is_empty() {
            self.save(drained, reason);
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.lock().len()
    }

    // The buffer is already cleared when this runs; a failed save drops
    // the drained records so the stream stays available.
    fn save(&self, records: Vec<MessageData>, reason: &str) {
        match self.storage.save(&records, &self.file_prefix) {
            Ok(path) => tracing::info!(
                target: "live",
                count = records.len(),
                reason,
                path = %path.display(),
                "live batch saved"
            ),
            Err(err) => tracing::error!(
                target: "live",
                error = %err,
                count = records.len(),
                reason,
                "failed to persist live batch; records dropped"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::RawMedia,
        infrastructure::shutdown::Shutdown,
        transport::MemoryTransport,
    };
    use tempfile::TempDir;

    fn channel() -> ChannelInfo {
        ChannelInfo {
            id: 7,
            name: "foo".into(),
            title: Some("Foo".into()),
        }
    }

    fn raw(id: i64, channel_id: i64) -> RawMessage {
        RawMessage {
            id,
            channel_id,
            date: 1_700_000_000 + id,
            text: format!("live {id}"),
            views: None,
            media: RawMedia::None,
        }
    }

    fn batcher(dir: &TempDir, threshold: usize) -> LiveBatcher {
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
        LiveBatcher::new(storage, "foo_live", threshold, Duration::from_secs(60))
    }

    fn record(id: i64) -> MessageData {
        normalize(&raw(id, 7), &channel())
    }

    #[test]
    fn ten_records_trigger_exactly_one_flush() {
        let dir = TempDir::new().unwrap();
        let batcher = batcher(&dir, 10);

        for id in 1..=10 {
            batcher.push(record(id));
        }
        assert_eq!(batcher.buffered(), 0);

        let storage = FileStorage::new(dir.path()).unwrap();
        let files = storage.list().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(storage.load(&files[0]).unwrap().len(), 10);

        // The next record starts a fresh buffer.
        batcher.push(record(11));
        assert_eq!(batcher.buffered(), 1);
        assert_eq!(storage.list().unwrap().len(), 1);
    }

    #[test]
    fn events_from_other_chats_are_silently_discarded() {
        let dir = TempDir::new().unwrap();
        let batcher = batcher(&dir, 10);
        batcher.handle_event(&raw(1, 999), &channel());
        assert_eq!(batcher.buffered(), 0);
        batcher.handle_event(&raw(2, 7), &channel());
        assert_eq!(batcher.buffered(), 1);
    }

    #[test]
    fn flush_drains_a_partial_buffer() {
        let dir = TempDir::new().unwrap();
        let batcher = batcher(&dir, 10);
        batcher.push(record(1));
        batcher.push(record(2));
        batcher.flush("interval");
        assert_eq!(batcher.buffered(), 0);

        let storage = FileStorage::new(dir.path()).unwrap();
        let files = storage.list().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(storage.load(&files[0]).unwrap().len(), 2);

        // Nothing buffered, nothing written.
        batcher.flush("interval");
        assert_eq!(storage.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn run_filters_and_flushes_on_stream_end() {
        let dir = TempDir::new().unwrap();
        let batcher = batcher(&dir, 10);

        let transport = MemoryTransport::new(vec![channel()]).with_events(vec![
            raw(1, 7),
            raw(2, 999),
            raw(3, 7),
            raw(4, 7),
        ]);

        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        batcher
            .run(&transport, &channel(), &mut listener)
            .await
            .unwrap();

        let storage = FileStorage::new(dir.path()).unwrap();
        let files = storage.list().unwrap();
        assert_eq!(files.len(), 1);
        let records = storage.load(&files[0]).unwrap();
        let ids: Vec<Option<i64>> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(1), Some(3), Some(4)]);
    }
}
