/// Channel entity as resolved by the transport.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub id: i64,
    /// Public identifier without the leading `@`; used to build t.me links.
    pub name: String,
    pub title: Option<String>,
}

/// One message as delivered by the transport, before normalization.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub id: i64,
    /// Origin chat id; the live path filters on this.
    pub channel_id: i64,
    /// Unix seconds.
    pub date: i64,
    pub text: String,
    pub views: Option<i64>,
    pub media: RawMedia,
}

/// Attached media, resolved to a closed set at the transport boundary.
/// Kinds the transport does not recognize map to `None`.
#[derive(Debug, Clone)]
pub enum RawMedia {
    Photo {
        sizes: Vec<RawPhotoSize>,
        caption: Option<String>,
    },
    Document {
        mime_type: Option<String>,
        caption: Option<String>,
    },
    WebPage {
        title: Option<String>,
        description: Option<String>,
        url: Option<String>,
    },
    None,
}

#[derive(Debug, Clone)]
pub struct RawPhotoSize {
    pub kind: PhotoSizeKind,
    /// Size-type tag carried into the synthesized locator URL.
    pub type_tag: String,
}

/// Size descriptor kinds. Only `Normal` and `Cached` yield a photo locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSizeKind {
    Normal,
    Cached,
    Stripped,
}
