use uuid::Uuid;

use chrono::{DateTime, Utc};

use serde::Serialize;

use crate::domain::EmailAddress;

/// New subscription request
#[derive(Debug)]
pub struct NewSubscriber {
    pub author_id: Uuid,
    pub email: EmailAddress,
    pub verification_token: String,
}

/// Stored subscriber record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscriber {
    /// ID of the subscriber
    pub id: Uuid,
    pub author_id: Uuid,
    /// User supplied data
    /// TODO: Should this be parsed back into domain objects?
    pub email: String,
    pub status: String,
    /// Single-use token, cleared once the subscription is verified
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    /// NOTE: Auto-set and updated by database triggers
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-status subscriber totals for the settings dashboard
#[derive(Debug, Default, Serialize)]
pub struct SubscriberStats {
    pub total: i64,
    pub active: i64,
    pub pending: i64,
    pub unsubscribed: i64,
}
