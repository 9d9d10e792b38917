use uuid::Uuid;

use chrono::{DateTime, Utc};

use serde::Serialize;

/// New post draft
#[derive(Debug)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Stored post record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
    /// ID of the post
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    /// URL fragment, unique per author
    pub slug: String,
    pub status: String,
    /// `None` until the post is published
    pub published_at: Option<DateTime<Utc>>,
    /// Set exactly once when the post goes out in a newsletter; the
    /// guard against redelivering the same post in a later digest run
    pub newsletter_sent_at: Option<DateTime<Utc>>,
    /// NOTE: Auto-set and updated by database triggers
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A post id/title pair for delivery-history rendering
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PostTitle {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}
