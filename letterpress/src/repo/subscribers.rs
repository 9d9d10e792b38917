use chrono::{DateTime, Utc};

use sqlx::{Executor, PgExecutor};

use uuid::Uuid;

use crate::model::{NewSubscriber, Subscriber, SubscriberStats};

const SUBSCRIBER_COLUMNS: &str = "id, author_id, email, status, verification_token, \
     verified_at, subscribed_at, unsubscribed_at, created_at, updated_at";

/// Subscriber repository trait, must be implemented for each database used.
/// NOTE: Intended to facilitate easier testing/mocking
/// TODO: Swap async-trait for std async traits when those become stable
#[async_trait::async_trait]
pub trait SubscriberRepo {
    type DB: sqlx::Database;

    /// Insert a new pending subscriber with a fresh verification token
    async fn insert_pending<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        new_subscriber: &NewSubscriber,
    ) -> sqlx::Result<Uuid>;

    /// Look up one subscription row by its (author, email) identity
    async fn fetch_by_author_and_email<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        author_id: Uuid,
        email: &str,
    ) -> sqlx::Result<Option<Subscriber>>;

    /// Look up the subscription holding an outstanding verification token
    async fn fetch_by_token<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        token: &str,
    ) -> sqlx::Result<Option<Subscriber>>;

    /// Re-subscribe flow: back to pending with a new token, verification
    /// and unsubscription timestamps reset
    async fn reissue_token<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        id: Uuid,
        token: &str,
    ) -> sqlx::Result<()>;

    /// Verification-token redemption: activate and clear the token
    async fn activate<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        id: Uuid,
        verified_at: DateTime<Utc>,
    ) -> sqlx::Result<()>;

    /// Opt-out, legal from any state
    async fn unsubscribe<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        id: Uuid,
        unsubscribed_at: DateTime<Utc>,
    ) -> sqlx::Result<()>;

    /// All subscribers eligible to receive mail for an author
    async fn fetch_active<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        author_id: Uuid,
    ) -> sqlx::Result<Vec<Subscriber>>;

    /// Dashboard listing, optionally narrowed to one status
    async fn fetch_by_author<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        author_id: Uuid,
        status: Option<&str>,
    ) -> sqlx::Result<Vec<Subscriber>>;

    /// Per-status totals for the settings dashboard
    async fn count_stats<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        author_id: Uuid,
    ) -> sqlx::Result<SubscriberStats>;
}

/// Postgres Subscriber Repository
#[derive(Debug)]
pub struct PgSubscriberRepo;

#[async_trait::async_trait]
impl SubscriberRepo for PgSubscriberRepo {
    type DB = sqlx::Postgres;

    #[tracing::instrument(name = "Insert pending subscriber", skip(executor, new_subscriber))]
    async fn insert_pending<'con>(
        executor: impl PgExecutor<'con>,
        new_subscriber: &NewSubscriber,
    ) -> sqlx::Result<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "insert into subscribers(author_id, email, status, verification_token) \
             values ($1, $2, 'pending', $3) returning id",
        )
        .bind(new_subscriber.author_id)
        .bind(new_subscriber.email.as_ref())
        .bind(&new_subscriber.verification_token)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    #[tracing::instrument(name = "Fetch subscriber by author and email", skip(executor))]
    async fn fetch_by_author_and_email<'con>(
        executor: impl PgExecutor<'con>,
        author_id: Uuid,
        email: &str,
    ) -> sqlx::Result<Option<Subscriber>> {
        sqlx::query_as(&format!(
            "select {} from subscribers where author_id=$1 and email=$2",
            SUBSCRIBER_COLUMNS
        ))
        .bind(author_id)
        .bind(email)
        .fetch_optional(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch subscriber by token", skip(executor, token))]
    async fn fetch_by_token<'con>(
        executor: impl PgExecutor<'con>,
        token: &str,
    ) -> sqlx::Result<Option<Subscriber>> {
        sqlx::query_as(&format!(
            "select {} from subscribers where verification_token=$1",
            SUBSCRIBER_COLUMNS
        ))
        .bind(token)
        .fetch_optional(executor)
        .await
    }

    #[tracing::instrument(name = "Reissue verification token", skip(executor, token))]
    async fn reissue_token<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        token: &str,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "update subscribers \
             set status='pending', verification_token=$2, \
             verified_at=null, unsubscribed_at=null \
             where id=$1",
        )
        .bind(id)
        .bind(token)
        .execute(executor)
        .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Activate subscriber", skip(executor))]
    async fn activate<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        verified_at: DateTime<Utc>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "update subscribers \
             set status='active', verification_token=null, verified_at=$2 \
             where id=$1",
        )
        .bind(id)
        .bind(verified_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Unsubscribe subscriber", skip(executor))]
    async fn unsubscribe<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        unsubscribed_at: DateTime<Utc>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "update subscribers set status='unsubscribed', unsubscribed_at=$2 where id=$1",
        )
        .bind(id)
        .bind(unsubscribed_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Fetch active subscribers", skip(executor))]
    async fn fetch_active<'con>(
        executor: impl PgExecutor<'con>,
        author_id: Uuid,
    ) -> sqlx::Result<Vec<Subscriber>> {
        sqlx::query_as(&format!(
            "select {} from subscribers \
             where author_id=$1 and status='active' \
             order by subscribed_at",
            SUBSCRIBER_COLUMNS
        ))
        .bind(author_id)
        .fetch_all(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch subscribers for author", skip(executor))]
    async fn fetch_by_author<'con>(
        executor: impl PgExecutor<'con>,
        author_id: Uuid,
        status: Option<&str>,
    ) -> sqlx::Result<Vec<Subscriber>> {
        sqlx::query_as(&format!(
            "select {} from subscribers \
             where author_id=$1 and ($2::text is null or status=$2) \
             order by subscribed_at desc",
            SUBSCRIBER_COLUMNS
        ))
        .bind(author_id)
        .bind(status)
        .fetch_all(executor)
        .await
    }

    #[tracing::instrument(name = "Count subscriber stats", skip(executor))]
    async fn count_stats<'con>(
        executor: impl PgExecutor<'con>,
        author_id: Uuid,
    ) -> sqlx::Result<SubscriberStats> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "select status, count(*) from subscribers \
             where author_id=$1 group by status",
        )
        .bind(author_id)
        .fetch_all(executor)
        .await?;

        let mut stats = SubscriberStats::default();
        for (status, count) in rows {
            stats.total += count;
            match status.as_str() {
                "active" => stats.active = count,
                "pending" => stats.pending = count,
                "unsubscribed" => stats.unsubscribed = count,
                _ => {}
            }
        }
        Ok(stats)
    }
}
