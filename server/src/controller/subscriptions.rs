use actix_web::dev::HttpServiceFactory;
use actix_web::{get, post, web, HttpResponse, Responder};

use serde::Deserialize;

use serde_json::json;

use sqlx::PgPool;

use letterpress::client::EmailClient;
use letterpress::crypto::VerificationToken;
use letterpress::delivery::render;
use letterpress::domain::EmailAddress;
use letterpress::model::{Author, NewSubscriber};
use letterpress::repo::{AuthorsRepo, PgSubscriberRepo, SubscriberRepo};

use crate::app::PublicBaseUrl;
use crate::error::{RestError, RestResult};

#[derive(Debug, Deserialize)]
pub struct SubscribeBody {
    email: String,
    username: String,
}

/// Create (or revive) a pending subscription and send the verification
/// message carrying its single-use token
#[tracing::instrument(
    name = "Subscribe to a newsletter",
    skip(pool, email_client, base_url)
)]
#[post("")]
async fn subscribe(
    body: web::Json<SubscribeBody>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<PublicBaseUrl>,
) -> RestResult<impl Responder> {
    let pool = pool.get_ref();

    let email: EmailAddress = body.email.parse().map_err(RestError::ParseError)?;

    let author = AuthorsRepo::fetch_by_username(pool, &body.username)
        .await?
        .ok_or_else(|| RestError::NotFound("Author not found".into()))?;

    if !author.newsletter_enabled {
        return Err(RestError::Forbidden(
            "Newsletter is not enabled for this author".into(),
        ));
    }

    let existing =
        PgSubscriberRepo::fetch_by_author_and_email(pool, author.id, email.as_ref()).await?;

    if let Some(subscriber) = &existing {
        if subscriber.status == "active" {
            return Ok(HttpResponse::Ok().json(json!({ "message": "Already subscribed" })));
        }
    }

    let token = VerificationToken::generate();
    match existing {
        Some(subscriber) => {
            // Re-subscribe or resend verification with a fresh token
            PgSubscriberRepo::reissue_token(pool, subscriber.id, token.as_ref()).await?;
        }
        None => {
            let new_subscriber = NewSubscriber {
                author_id: author.id,
                email: email.clone(),
                verification_token: token.as_ref().into(),
            };
            PgSubscriberRepo::insert_pending(pool, &new_subscriber).await?;
        }
    }

    send_verification_email(&email_client, &base_url.0, &author, &email, &token).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Verification email sent" })))
}

/// Redeem a verification token. Redeeming for an already-active
/// subscription is a no-op success
#[tracing::instrument(name = "Confirm a subscription by token", skip(pool))]
#[get("/confirm/{token}")]
async fn confirm(
    token: web::Path<String>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let pool = pool.get_ref();

    let token: VerificationToken = token.parse().map_err(RestError::ParseError)?;

    let subscriber = PgSubscriberRepo::fetch_by_token(pool, token.as_ref())
        .await?
        .ok_or_else(|| RestError::NotFound("Invalid or expired token".into()))?;

    if subscriber.status == "active" {
        return Ok(HttpResponse::Ok().json(json!({ "message": "Already verified" })));
    }

    PgSubscriberRepo::activate(pool, subscriber.id, chrono::Utc::now()).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Subscription verified" })))
}

/// Opt out. Already-unsubscribed is a no-op success
#[tracing::instrument(name = "Unsubscribe from a newsletter", skip(pool))]
#[post("/unsubscribe")]
async fn unsubscribe(
    body: web::Json<SubscribeBody>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let pool = pool.get_ref();

    let email: EmailAddress = body.email.parse().map_err(RestError::ParseError)?;

    let author = AuthorsRepo::fetch_by_username(pool, &body.username)
        .await?
        .ok_or_else(|| RestError::NotFound("Author not found".into()))?;

    let subscriber = PgSubscriberRepo::fetch_by_author_and_email(pool, author.id, email.as_ref())
        .await?
        .ok_or_else(|| RestError::NotFound("Subscription not found".into()))?;

    if subscriber.status == "unsubscribed" {
        return Ok(HttpResponse::Ok().json(json!({ "message": "Already unsubscribed" })));
    }

    PgSubscriberRepo::unsubscribe(pool, subscriber.id, chrono::Utc::now()).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully unsubscribed" })))
}

async fn send_verification_email(
    email_client: &EmailClient,
    base_url: &url::Url,
    author: &Author,
    recipient: &EmailAddress,
    token: &VerificationToken,
) -> RestResult<()> {
    let confirmation = render::confirmation_url(base_url, &author.username, token.as_ref());
    let subject = format!("Confirm your subscription to {}", author.byline());
    let html_body = render::verification_html(author.byline(), &confirmation);
    let text_body = render::verification_text(author.byline(), &confirmation);

    email_client
        .send(recipient, &subject, &html_body, &text_body)
        .await
        .map_err(|e| RestError::InternalError(format!("Failed to send verification email: {}", e)))
}

/// Subscriptions API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/subscriptions")
        .service(subscribe)
        .service(confirm)
        .service(unsubscribe)
}
