use chrono::Utc;

use serde::Serialize;

use sqlx::PgPool;

use url::Url;

use uuid::Uuid;

use crate::client::EmailClient;
use crate::delivery::executor::{self, RecipientFailure};
use crate::delivery::BatchPacer;
use crate::error::Result;
use crate::model::{Author, NewDelivery, Post, Subscriber};
use crate::repo::{AuthorsRepo, DeliveriesRepo, PostsRepo};

/// Caller-facing result of one completed send
#[derive(Debug, Serialize)]
pub struct DeliverySummary {
    pub delivery_id: Uuid,
    pub sent_count: i32,
    pub failed_count: i32,
    pub failures: Vec<RecipientFailure>,
}

/// Make one send attempt durable and idempotent against redelivery.
///
/// The steps run strictly in order:
/// 1. open the audit row in `sending` status — if this fails nothing is
///    sent;
/// 2. dispatch to every subscriber;
/// 3. close the audit row with the final counts;
/// 4. stamp every included post as sent, regardless of failure count;
/// 5. advance the author's last-sent marker.
#[tracing::instrument(
    "Record and dispatch send",
    skip(pool, email_client, pacer, base_url, author, posts, subscribers),
    fields(author_id = %author.id)
)]
pub async fn record_and_dispatch(
    pool: &PgPool,
    email_client: &EmailClient,
    pacer: &BatchPacer,
    base_url: &Url,
    author: &Author,
    posts: &[Post],
    subscribers: &[Subscriber],
) -> Result<DeliverySummary> {
    let subject = author.newsletter_subject();
    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

    let new_delivery = NewDelivery {
        author_id: author.id,
        subject: subject.clone(),
        post_ids: post_ids.clone(),
        subscriber_count: subscribers.len() as i32,
    };
    let delivery_id = DeliveriesRepo::insert_sending(pool, &new_delivery).await?;

    let outcome = executor::dispatch(
        email_client,
        pacer,
        base_url,
        author,
        &subject,
        posts,
        subscribers,
    )
    .await;

    DeliveriesRepo::complete(
        pool,
        delivery_id,
        outcome.sent_count,
        outcome.failed_count,
        outcome.error_detail(),
    )
    .await?;

    // A partial failure still marks the posts as sent; retrying the
    // failed recipients is out of scope here
    let now = Utc::now();
    PostsRepo::mark_sent(pool, &post_ids, now).await?;
    AuthorsRepo::stamp_last_sent(pool, author.id, now).await?;

    Ok(DeliverySummary {
        delivery_id,
        sent_count: outcome.sent_count,
        failed_count: outcome.failed_count,
        failures: outcome.failures,
    })
}
