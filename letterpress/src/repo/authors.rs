use chrono::{DateTime, Utc};

use secrecy::Secret;

use sqlx::PgExecutor;

use uuid::Uuid;

use crate::domain::EmailAddress;
use crate::model::{Author, NewAuthor, NewsletterSettingsUpdate};

const AUTHOR_COLUMNS: &str = "id, email, username, display_name, role, \
     newsletter_enabled, newsletter_send_mode, newsletter_frequency, \
     newsletter_title, newsletter_description, newsletter_from_name, \
     newsletter_from_email, newsletter_last_sent_at, \
     created_at, updated_at, deleted_at";

#[derive(Debug)]
pub struct AuthorCredentials {
    pub id: Uuid,
    pub role: String,
    pub password_hash: Secret<String>,
}

pub struct AuthorsRepo;

impl AuthorsRepo {
    #[tracing::instrument("Insert a new author record", skip(executor))]
    pub async fn insert<'conn>(
        executor: impl PgExecutor<'conn>,
        new_author: &NewAuthor,
    ) -> sqlx::Result<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "insert into authors(email, username, password_hash) \
             values ($1, $2, $3) returning id",
        )
        .bind(new_author.email.as_ref())
        .bind(&new_author.username)
        .bind(&new_author.password_hash)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    #[tracing::instrument("Fetch an author by id", skip(executor))]
    pub async fn fetch_by_id<'conn>(
        executor: impl PgExecutor<'conn>,
        id: Uuid,
    ) -> sqlx::Result<Option<Author>> {
        sqlx::query_as(&format!(
            "select {} from authors where id=$1 and deleted_at is null",
            AUTHOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    #[tracing::instrument("Fetch an author by username", skip(executor))]
    pub async fn fetch_by_username<'conn>(
        executor: impl PgExecutor<'conn>,
        username: &str,
    ) -> sqlx::Result<Option<Author>> {
        sqlx::query_as(&format!(
            "select {} from authors where username=$1 and deleted_at is null",
            AUTHOR_COLUMNS
        ))
        .bind(username)
        .fetch_optional(executor)
        .await
    }

    /// Authors that could be picked up by an automatic digest run:
    /// newsletter on, digest mode, not deleted. Frequency gating happens
    /// in the scanner
    #[tracing::instrument("Fetch digest candidates", skip(executor))]
    pub async fn fetch_digest_candidates<'conn>(
        executor: impl PgExecutor<'conn>,
    ) -> sqlx::Result<Vec<Author>> {
        sqlx::query_as(&format!(
            "select {} from authors \
             where newsletter_enabled and newsletter_send_mode='digest' \
             and deleted_at is null \
             order by created_at",
            AUTHOR_COLUMNS
        ))
        .fetch_all(executor)
        .await
    }

    pub async fn fetch_credentials_by_email<'conn>(
        executor: impl PgExecutor<'conn>,
        email: &EmailAddress,
    ) -> sqlx::Result<Option<AuthorCredentials>> {
        let row: Option<(Uuid, String, String)> = sqlx::query_as(
            "select id, role, password_hash from authors \
             where email=$1 and deleted_at is null",
        )
        .bind(email.as_ref())
        .fetch_optional(executor)
        .await?;

        Ok(row.map(|(id, role, password_hash)| AuthorCredentials {
            id,
            role,
            password_hash: Secret::new(password_hash),
        }))
    }

    /// Advance the last-digest-sent marker. `greatest` keeps the column
    /// monotonically non-decreasing even if a concurrent run raced it
    #[tracing::instrument("Stamp author last sent", skip(executor))]
    pub async fn stamp_last_sent<'conn>(
        executor: impl PgExecutor<'conn>,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "update authors \
             set newsletter_last_sent_at=greatest(newsletter_last_sent_at, $2) \
             where id=$1",
        )
        .bind(id)
        .bind(sent_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Apply a partial settings update; absent fields keep their value
    #[tracing::instrument("Update newsletter settings", skip(executor, update))]
    pub async fn update_newsletter_settings<'conn>(
        executor: impl PgExecutor<'conn>,
        id: Uuid,
        update: &NewsletterSettingsUpdate,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "update authors set \
             newsletter_enabled = coalesce($2, newsletter_enabled), \
             newsletter_send_mode = coalesce($3, newsletter_send_mode), \
             newsletter_frequency = coalesce($4, newsletter_frequency), \
             newsletter_title = coalesce($5, newsletter_title), \
             newsletter_description = coalesce($6, newsletter_description), \
             newsletter_from_name = coalesce($7, newsletter_from_name), \
             newsletter_from_email = coalesce($8, newsletter_from_email) \
             where id=$1",
        )
        .bind(id)
        .bind(update.enabled)
        .bind(update.send_mode.as_deref())
        .bind(update.frequency.as_deref())
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.from_name.as_deref())
        .bind(update.from_email.as_deref())
        .execute(executor)
        .await?;
        Ok(())
    }
}
