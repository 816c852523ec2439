use anyhow::anyhow;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use teloxide::{
    prelude::*,
    types::{Recipient, UpdateKind},
    update_listeners::{self, AsUpdateStream},
    ApiError, RequestError,
};
use tokio::sync::mpsc;

use super::mapper::map_message;
use crate::{
    domain::{ChannelInfo, RawMessage},
    transport::{ChannelTransport, PageRequest, TransportError},
};

/// `ChannelTransport` over the Bot API. A bot token cannot page MTProto
/// channel history, so `fetch_page` drains the pending channel-post
/// backlog through `get_updates` offset paging, the paging primitive the
/// Bot API actually has.
pub struct BotApiTransport {
    bot: Bot,
}

impl BotApiTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn recipient(name: &str) -> Recipient {
        match name.parse::<i64>() {
            Ok(id) => Recipient::Id(ChatId(id)),
            Err(_) => Recipient::ChannelUsername(format!("@{}", name.trim_start_matches('@'))),
        }
    }
}

#[async_trait]
impl ChannelTransport for BotApiTransport {
    async fn resolve_channel(&self, name: &str) -> Result<ChannelInfo, TransportError> {
        let chat = self
            .bot
            .get_chat(Self::recipient(name))
            .await
            .map_err(|err| match err {
                RequestError::Api(ApiError::ChatNotFound) => {
                    TransportError::ChannelNotFound(name.to_string())
                }
                other => TransportError::Api(anyhow!(other)),
            })?;

        let info = ChannelInfo {
            id: chat.id.0,
            name: chat
                .username()
                .map(str::to_string)
                .unwrap_or_else(|| name.trim_start_matches('@').to_string()),
            title: chat.title().map(str::to_string),
        };
        tracing::info!(
            target: "telegram",
            channel = %info.name,
            chat_id = info.id,
            title = ?info.title,
            "channel resolved"
        );
        Ok(info)
    }

    async fn fetch_page(
        &self,
        channel: &ChannelInfo,
        page: &PageRequest,
    ) -> Result<Vec<RawMessage>, TransportError> {
        let mut collected = Vec::new();
        let mut offset: Option<i32> = None;

        loop {
            let mut call = self.bot.get_updates().limit(100);
            if let Some(offset) = offset {
                call = call.offset(offset);
            }
            let updates = call.await.map_err(|err| TransportError::Api(anyhow!(err)))?;
            if updates.is_empty() {
                break;
            }

            for update in updates {
                offset = Some(update.id.0 as i32 + 1);
                if let UpdateKind::ChannelPost(message) = update.kind {
                    if message.chat.id.0 != channel.id {
                        continue;
                    }
                    let raw = map_message(&message);
                    if page.admits(raw.id) {
                        collected.push(raw);
                    }
                }
            }

            if collected.len() >= page.limit {
                collected.truncate(page.limit);
                break;
            }
        }

        tracing::info!(
            target: "telegram",
            channel = %channel.name,
            count = collected.len(),
            "backlog drained"
        );
        Ok(collected)
    }

    fn subscribe(&self, channel: &ChannelInfo) -> BoxStream<'static, RawMessage> {
        let bot = self.bot.clone();
        let channel_name = channel.name.clone();
        let (tx, rx) = mpsc::channel::<RawMessage>(64);

        tokio::spawn(async move {
            let mut listener = update_listeners::polling_default(bot).await;
            let updates = listener.as_stream();
            tokio::pin!(updates);
            tracing::info!(target: "telegram", channel = %channel_name, "update listener started");

            loop {
                tokio::select! {
                    next = updates.next() => match next {
                        Some(Ok(update)) => {
                            if let UpdateKind::ChannelPost(message) = update.kind {
                                if tx.send(map_message(&message)).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Err(err)) => {
                            tracing::warn!(
                                target: "telegram",
                                error = %err,
                                "update listener error"
                            );
                        }
                        None => break,
                    },
                    _ = tx.closed() => break,
                }
            }
            tracing::info!(target: "telegram", channel = %channel_name, "update listener stopped");
        });

        stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|message| (message, rx))
        })
        .boxed()
    }
}
