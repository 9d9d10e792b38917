use uuid::Uuid;

use chrono::{DateTime, Utc};

use serde::Serialize;

use crate::domain::EmailAddress;

/// New author registration
#[derive(Debug)]
pub struct NewAuthor {
    pub email: EmailAddress,
    pub username: String,
    pub password_hash: String,
}

/// Stored author record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Author {
    /// ID of the author
    pub id: Uuid,
    /// User supplied data, stored as raw strings and parsed back into
    /// domain objects where a decision depends on them
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub role: String,
    /// Newsletter configuration
    pub newsletter_enabled: bool,
    pub newsletter_send_mode: String,
    pub newsletter_frequency: String,
    pub newsletter_title: Option<String>,
    pub newsletter_description: Option<String>,
    pub newsletter_from_name: Option<String>,
    pub newsletter_from_email: Option<String>,
    /// Timestamp of the last completed digest send.
    /// `None` if this author has never sent a newsletter
    pub newsletter_last_sent_at: Option<DateTime<Utc>>,
    /// Creation and update timestamps
    /// NOTE: Auto-set and updated by database triggers
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Tombstone timestamp. A deleted author is excluded from all
    /// further processing
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Author {
    /// The public-facing name used in email branding
    pub fn byline(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    /// Subject line for a newsletter send
    pub fn newsletter_subject(&self) -> String {
        self.newsletter_title
            .clone()
            .unwrap_or_else(|| format!("Latest posts from {}", self.byline()))
    }
}

/// Partial update for an author's newsletter settings. `None` fields are
/// left untouched.
#[derive(Debug, Default)]
pub struct NewsletterSettingsUpdate {
    pub enabled: Option<bool>,
    pub send_mode: Option<String>,
    pub frequency: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub from_name: Option<String>,
    pub from_email: Option<String>,
}
