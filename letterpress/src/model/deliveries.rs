use uuid::Uuid;

use chrono::{DateTime, Utc};

use serde::Serialize;

/// Fields captured when a delivery attempt starts
#[derive(Debug)]
pub struct NewDelivery {
    pub author_id: Uuid,
    pub subject: String,
    pub post_ids: Vec<Uuid>,
    pub subscriber_count: i32,
}

/// Stored delivery record: one audit row per send attempt, never deleted
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Delivery {
    /// ID of the delivery
    pub id: Uuid,
    pub author_id: Uuid,
    pub subject: String,
    /// Posts included in this send
    pub post_ids: Vec<Uuid>,
    /// Recipient count at send time; `sent_count + failed_count` equals
    /// this once the row is completed
    pub subscriber_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    /// Created `sending`, updated to `completed` after every recipient
    /// has been attempted. A row stuck in `sending` marks a dispatch
    /// that crashed mid-run
    pub status: String,
    /// Serialized list of per-recipient failures, `None` when clean
    pub error_detail: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
