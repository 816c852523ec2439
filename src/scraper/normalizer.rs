use chrono::{SecondsFormat, TimeZone, Utc};
use thiserror::Error;

use crate::domain::{ChannelInfo, MessageData, PhotoSizeKind, RawMedia, RawMessage};

const ERROR_PLACEHOLDER: &str = "[Error processing message content]";
const VIDEO_PLACEHOLDER: &str = "[Video message without text]";
const EPOCH_ISO: &str = "1970-01-01T00:00:00.000Z";

#[derive(Debug, Error)]
enum NormalizeError {
    #[error("timestamp {0} is outside the representable range")]
    Timestamp(i64),
}

/// Turn one raw channel message into the canonical record. Total: any
/// internal failure degrades to a fallback record instead of propagating,
/// so callers always get exactly one record per input.
pub fn normalize(raw: &RawMessage, channel: &ChannelInfo) -> MessageData {
    match build_record(raw, channel) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(
                target: "normalizer",
                error = %err,
                message_id = raw.id,
                channel = %channel.name,
                "falling back to degraded record"
            );
            degraded_record(raw, channel)
        }
    }
}

/// Unix seconds to ISO-8601 with milliseconds and `Z` suffix.
pub fn format_datetime(unix_seconds: i64) -> Option<String> {
    Utc.timestamp_opt(unix_seconds, 0)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

struct MediaExtract {
    photos: Vec<String>,
    videos: Vec<String>,
    caption: Option<String>,
}

fn build_record(raw: &RawMessage, channel: &ChannelInfo) -> Result<MessageData, NormalizeError> {
    let datetime = format_datetime(raw.date).ok_or(NormalizeError::Timestamp(raw.date))?;
    let extract = extract_media(raw, channel);
    let message_text = resolve_text(raw, &extract);

    Ok(MessageData {
        data_post: format!("{}/{}", channel.name, raw.id),
        user_url: format!("https://t.me/{}", channel.name),
        user_name: channel
            .title
            .clone()
            .unwrap_or_else(|| channel.name.clone()),
        user_photo: Some(format!("https://t.me/{}/profile-photo", channel.name)),
        message_url: format!("https://t.me/{}/{}", channel.name, raw.id),
        message_text,
        message_photo: extract.photos,
        message_video: extract.videos,
        views: Some(
            raw.views
                .map(|v| v.to_string())
                .unwrap_or_else(|| "0".to_string()),
        ),
        datetime,
        id: Some(raw.id),
    })
}

fn extract_media(raw: &RawMessage, channel: &ChannelInfo) -> MediaExtract {
    let mut photos = Vec::new();
    let mut videos = Vec::new();
    let mut caption = None;

    match &raw.media {
        RawMedia::Photo { sizes, caption: c } => {
            caption = present(c);
            // One representative locator, from the first recognized size.
            for size in sizes {
                if matches!(size.kind, PhotoSizeKind::Normal | PhotoSizeKind::Cached) {
                    photos.push(format!(
                        "https://t.me/{}/{}?single&photo={}",
                        channel.name, raw.id, size.type_tag
                    ));
                    break;
                }
            }
        }
        RawMedia::Document {
            mime_type,
            caption: c,
        } => {
            caption = present(c);
            let is_video = mime_type
                .as_deref()
                .is_some_and(|mime| mime.starts_with("video/"));
            if is_video {
                videos.push(format!("https://t.me/{}/{}?single", channel.name, raw.id));
            }
        }
        RawMedia::WebPage {
            title,
            description,
            url,
        } => {
            let mut info = String::new();
            if let Some(title) = present(title) {
                info.push_str("Title: ");
                info.push_str(&title);
                info.push('\n');
            }
            if let Some(description) = present(description) {
                info.push_str("Description: ");
                info.push_str(&description);
                info.push('\n');
            }
            if let Some(url) = present(url) {
                info.push_str("URL: ");
                info.push_str(&url);
            }
            if !info.is_empty() {
                caption = Some(info);
            }
        }
        RawMedia::None => {}
    }

    MediaExtract {
        photos,
        videos,
        caption,
    }
}

/// Text priority: own text, extracted caption, photo placeholder, video
/// placeholder, empty.
fn resolve_text(raw: &RawMessage, extract: &MediaExtract) -> String {
    if !raw.text.is_empty() {
        return raw.text.clone();
    }
    if let Some(caption) = &extract.caption {
        return format!("[Media Caption] {caption}");
    }
    if !extract.photos.is_empty() {
        return format!(
            "[Photo message without text, {} photo(s)]",
            extract.photos.len()
        );
    }
    if !extract.videos.is_empty() {
        return VIDEO_PLACEHOLDER.to_string();
    }
    String::new()
}

/// Whitespace-only strings count as absent; non-empty values are trimmed.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn degraded_record(raw: &RawMessage, channel: &ChannelInfo) -> MessageData {
    MessageData {
        data_post: format!("{}/{}", channel.name, raw.id),
        user_url: format!("https://t.me/{}", channel.name),
        user_name: channel.name.clone(),
        user_photo: None,
        message_url: format!("https://t.me/{}/{}", channel.name, raw.id),
        message_text: ERROR_PLACEHOLDER.to_string(),
        message_photo: Vec::new(),
        message_video: Vec::new(),
        views: None,
        datetime: format_datetime(raw.date).unwrap_or_else(|| EPOCH_ISO.to_string()),
        id: Some(raw.id),
    }
}
