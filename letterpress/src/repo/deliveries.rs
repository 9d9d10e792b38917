use sqlx::PgExecutor;

use uuid::Uuid;

use crate::model::{Delivery, NewDelivery};

const DELIVERY_COLUMNS: &str = "id, author_id, subject, post_ids, subscriber_count, \
     sent_count, failed_count, status, error_detail, sent_at, created_at";

pub struct DeliveriesRepo;

impl DeliveriesRepo {
    /// Open the audit row before any mail goes out; its existence is the
    /// evidence a send was attempted even if the process dies mid-batch
    #[tracing::instrument("Insert delivery in sending state", skip(executor, new_delivery))]
    pub async fn insert_sending<'conn>(
        executor: impl PgExecutor<'conn>,
        new_delivery: &NewDelivery,
    ) -> sqlx::Result<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "insert into deliveries(author_id, subject, post_ids, subscriber_count, status) \
             values ($1, $2, $3, $4, 'sending') returning id",
        )
        .bind(new_delivery.author_id)
        .bind(&new_delivery.subject)
        .bind(&new_delivery.post_ids)
        .bind(new_delivery.subscriber_count)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Close the audit row once every recipient has been attempted
    #[tracing::instrument("Complete delivery", skip(executor, error_detail))]
    pub async fn complete<'conn>(
        executor: impl PgExecutor<'conn>,
        id: Uuid,
        sent_count: i32,
        failed_count: i32,
        error_detail: Option<String>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "update deliveries \
             set status='completed', sent_count=$2, failed_count=$3, error_detail=$4 \
             where id=$1",
        )
        .bind(id)
        .bind(sent_count)
        .bind(failed_count)
        .bind(error_detail)
        .execute(executor)
        .await?;
        Ok(())
    }

    #[tracing::instrument("Fetch delivery by id", skip(executor))]
    pub async fn fetch_by_id<'conn>(
        executor: impl PgExecutor<'conn>,
        id: Uuid,
    ) -> sqlx::Result<Option<Delivery>> {
        sqlx::query_as(&format!(
            "select {} from deliveries where id=$1",
            DELIVERY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Delivery history for the dashboard, newest first
    #[tracing::instrument("Fetch deliveries for author", skip(executor))]
    pub async fn fetch_by_author<'conn>(
        executor: impl PgExecutor<'conn>,
        author_id: Uuid,
    ) -> sqlx::Result<Vec<Delivery>> {
        sqlx::query_as(&format!(
            "select {} from deliveries where author_id=$1 order by sent_at desc",
            DELIVERY_COLUMNS
        ))
        .bind(author_id)
        .fetch_all(executor)
        .await
    }
}
