use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical output record. Field names are the stable on-disk schema;
/// downstream consumers match on them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    pub data_post: String,
    pub user_url: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_photo: Option<String>,
    pub message_url: String,
    pub message_text: String,
    pub message_photo: Vec<String>,
    pub message_video: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
    pub datetime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// Immutable snapshot of one fetch call.
#[derive(Debug, Clone, Serialize)]
pub struct MessageBatch {
    pub channel_name: String,
    pub messages: Vec<MessageData>,
    pub total_count: usize,
    pub batch_timestamp: DateTime<Utc>,
}

/// Pagination and window controls for a batch fetch. `from_date`/`to_date`
/// are applied client-side on the derived datetime, never pushed down to
/// the transport.
#[derive(Debug, Clone)]
pub struct ScraperOptions {
    pub limit: usize,
    pub offset_id: i64,
    pub min_id: i64,
    pub max_id: i64,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            limit: 100,
            offset_id: 0,
            min_id: 0,
            max_id: 0,
            from_date: None,
            to_date: None,
        }
    }
}
