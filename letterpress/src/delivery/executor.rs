use serde::{Deserialize, Serialize};

use url::Url;

use crate::client::{EmailClient, Sender};
use crate::delivery::render;
use crate::delivery::BatchPacer;
use crate::domain::EmailAddress;
use crate::model::{Author, Post, Subscriber};

/// One recipient the transport (or address parsing) rejected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientFailure {
    pub email: String,
    pub error: String,
}

/// The executor's accounting: success count plus failure count always
/// equals the number of subscribers attempted. Partial failure is data,
/// not an error.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub sent_count: i32,
    pub failed_count: i32,
    pub failures: Vec<RecipientFailure>,
}

impl DispatchOutcome {
    /// Serialized failure list for the delivery audit row, `None` when
    /// every recipient succeeded
    pub fn error_detail(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        serde_json::to_string(&self.failures).ok()
    }
}

/// Render and transmit one personalized message per subscriber.
///
/// Recipients are walked in transport-sized batches with a pause between
/// batches (never within one). A failure for one recipient is recorded
/// and the loop moves on; nothing here touches the database.
#[tracing::instrument(
    "Dispatch newsletter",
    skip(email_client, pacer, base_url, author, posts, subscribers),
    fields(author_id = %author.id, recipients = subscribers.len())
)]
pub async fn dispatch(
    email_client: &EmailClient,
    pacer: &BatchPacer,
    base_url: &Url,
    author: &Author,
    subject: &str,
    posts: &[Post],
    subscribers: &[Subscriber],
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    let sender = sender_for(author, email_client.default_sender());

    let batches: Vec<_> = pacer.batches(subscribers).collect();
    let batch_count = batches.len();

    for (index, batch) in batches.into_iter().enumerate() {
        for subscriber in batch {
            match send_one(email_client, &sender, base_url, author, subject, posts, subscriber)
                .await
            {
                Ok(()) => outcome.sent_count += 1,
                Err(error) => {
                    tracing::warn!(
                        error.cause_chain = ?error,
                        "Failed to send to subscriber (id: {}, email: {})",
                        subscriber.id,
                        subscriber.email
                    );
                    outcome.failed_count += 1;
                    outcome.failures.push(RecipientFailure {
                        email: subscriber.email.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        if index + 1 < batch_count {
            pacer.pause().await;
        }
    }

    outcome
}

async fn send_one(
    email_client: &EmailClient,
    sender: &Sender,
    base_url: &Url,
    author: &Author,
    subject: &str,
    posts: &[Post],
    subscriber: &Subscriber,
) -> anyhow::Result<()> {
    let recipient: EmailAddress = subscriber
        .email
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let unsubscribe = render::unsubscribe_url(base_url, &author.username, subscriber.email.as_str());
    let html_body = render::newsletter_html(author, posts, base_url, &unsubscribe);
    let text_body = render::newsletter_text(author, posts, base_url, &unsubscribe);

    email_client
        .send_from(sender, &recipient, subject, &html_body, &text_body)
        .await
}

/// Authors may brand the from-line; missing pieces fall back to the
/// author's byline and the platform sender address
fn sender_for(author: &Author, default: &Sender) -> Sender {
    let address = author
        .newsletter_from_email
        .as_deref()
        .and_then(|addr| addr.parse::<EmailAddress>().ok())
        .unwrap_or_else(|| default.address.clone());
    let name = author
        .newsletter_from_name
        .clone()
        .unwrap_or_else(|| author.byline().to_string());

    Sender { name, address }
}
