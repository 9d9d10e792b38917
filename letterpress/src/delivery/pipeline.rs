use chrono::{DateTime, Utc};

use serde::Serialize;

use sqlx::PgPool;

use url::Url;

use uuid::Uuid;

use crate::client::EmailClient;
use crate::delivery::ledger::{self, DeliverySummary};
use crate::delivery::{scanner, selector, BatchPacer};
use crate::domain::Actor;
use crate::error::{Error, Result};
use crate::repo::{AuthorsRepo, PgSubscriberRepo, SubscriberRepo};

/// Why a pipeline run ended without contacting anyone. Not an error:
/// nothing was sent and nothing was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotDue,
    NoUnsentPosts,
    NoActiveSubscribers,
}

impl SkipReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotDue => "not due yet",
            Self::NoUnsentPosts => "no unsent posts",
            Self::NoActiveSubscribers => "no active subscribers",
        }
    }
}

/// Result of one pipeline run for one author
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum SendOutcome {
    Sent(DeliverySummary),
    Skipped { reason: SkipReason },
}

/// One entry in the scheduled scan's per-author report
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub author_id: Uuid,
    pub author_name: String,
    pub outcome: ScanOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum ScanOutcome {
    Sent {
        delivery_id: Uuid,
        sent_count: i32,
        failed_count: i32,
    },
    Skipped {
        reason: SkipReason,
    },
    Failed {
        error: String,
    },
}

/// One pipeline run for one author: selector, executor, ledger in strict
/// order. `post_ids` switches the selector to manual mode.
///
/// Preconditions are checked before any side effect: unknown (or
/// tombstoned) author and disabled newsletter are hard errors, as is an
/// actor without authority over this newsletter. An empty post or
/// subscriber set is a skip, not an error.
#[tracing::instrument("Send newsletter now", skip(pool, email_client, pacer, base_url, actor))]
pub async fn send_now(
    pool: &PgPool,
    email_client: &EmailClient,
    pacer: &BatchPacer,
    base_url: &Url,
    actor: &Actor,
    author_id: Uuid,
    post_ids: Option<&[Uuid]>,
) -> Result<SendOutcome> {
    if !actor.can_manage(author_id) {
        return Err(Error::Forbidden(author_id));
    }

    let author = AuthorsRepo::fetch_by_id(pool, author_id)
        .await?
        .ok_or(Error::AuthorNotFound(author_id))?;

    if !author.newsletter_enabled {
        return Err(Error::NewsletterDisabled(author_id));
    }

    let posts = selector::select_posts(pool, author_id, post_ids).await?;
    if posts.is_empty() {
        return Ok(SendOutcome::Skipped {
            reason: SkipReason::NoUnsentPosts,
        });
    }

    let subscribers = PgSubscriberRepo::fetch_active(pool, author_id).await?;
    if subscribers.is_empty() {
        return Ok(SendOutcome::Skipped {
            reason: SkipReason::NoActiveSubscribers,
        });
    }

    let summary = ledger::record_and_dispatch(
        pool,
        email_client,
        pacer,
        base_url,
        &author,
        &posts,
        &subscribers,
    )
    .await?;

    Ok(SendOutcome::Sent(summary))
}

/// Scheduled entry point: one automatic pipeline run per due author.
///
/// Authors are processed sequentially, each one fully completed (or
/// failed) before the next begins. A failure for one author is caught
/// and reported in its entry; it never aborts the scan.
#[tracing::instrument("Scan and send due newsletters", skip(pool, email_client, pacer, base_url))]
pub async fn scan_and_send_due(
    pool: &PgPool,
    email_client: &EmailClient,
    pacer: &BatchPacer,
    base_url: &Url,
    now: DateTime<Utc>,
) -> Result<Vec<ScanReport>> {
    let candidates = AuthorsRepo::fetch_digest_candidates(pool).await?;

    let mut reports = Vec::with_capacity(candidates.len());
    for author in candidates {
        let author_name = author.byline().to_string();

        let outcome = if !scanner::is_due(
            &author.newsletter_frequency,
            author.newsletter_last_sent_at,
            now,
        ) {
            ScanOutcome::Skipped {
                reason: SkipReason::NotDue,
            }
        } else {
            let run = send_now(
                pool,
                email_client,
                pacer,
                base_url,
                &Actor::System,
                author.id,
                None,
            )
            .await;

            match run {
                Ok(SendOutcome::Sent(summary)) => ScanOutcome::Sent {
                    delivery_id: summary.delivery_id,
                    sent_count: summary.sent_count,
                    failed_count: summary.failed_count,
                },
                Ok(SendOutcome::Skipped { reason }) => ScanOutcome::Skipped { reason },
                Err(error) => {
                    tracing::error!(
                        error.cause_chain = ?error,
                        "Newsletter run failed for author {}", author.id
                    );
                    ScanOutcome::Failed {
                        error: error.to_string(),
                    }
                }
            }
        };

        reports.push(ScanReport {
            author_id: author.id,
            author_name,
            outcome,
        });
    }

    Ok(reports)
}
