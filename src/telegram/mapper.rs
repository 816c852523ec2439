use teloxide::types::Message;

use crate::domain::{PhotoSizeKind, RawMedia, RawMessage, RawPhotoSize};

// Telegram's thumbnail ladder, smallest first; the Bot API returns photo
// sizes in ascending order.
const SIZE_TAGS: [&str; 5] = ["s", "m", "x", "y", "w"];

/// Convert a Bot API message into the raw envelope the normalizer
/// consumes. The Bot API exposes no view counts and no webpage preview
/// metadata, so those stay empty here.
pub fn map_message(message: &Message) -> RawMessage {
    RawMessage {
        id: i64::from(message.id.0),
        channel_id: message.chat.id.0,
        date: message.date.timestamp(),
        text: message.text().unwrap_or_default().to_string(),
        views: None,
        media: map_media(message),
    }
}

fn map_media(message: &Message) -> RawMedia {
    let caption = message.caption().map(str::to_string);

    if let Some(sizes) = message.photo() {
        let sizes = sizes
            .iter()
            .enumerate()
            .map(|(index, _)| RawPhotoSize {
                kind: PhotoSizeKind::Normal,
                type_tag: SIZE_TAGS
                    .get(index)
                    .copied()
                    .unwrap_or(SIZE_TAGS[SIZE_TAGS.len() - 1])
                    .to_string(),
            })
            .collect();
        return RawMedia::Photo { sizes, caption };
    }

    if let Some(video) = message.video() {
        return RawMedia::Document {
            mime_type: video.mime_type.as_ref().map(|mime| mime.to_string()),
            caption,
        };
    }

    if let Some(document) = message.document() {
        return RawMedia::Document {
            mime_type: document.mime_type.as_ref().map(|mime| mime.to_string()),
            caption,
        };
    }

    RawMedia::None
}
