use actix_web::{get, put, web, HttpResponse, Responder};

use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use sqlx::PgPool;

use letterpress::domain::{DigestFrequency, EmailAddress, SendMode, SubscriberStatus};
use letterpress::model::{Author, NewsletterSettingsUpdate};
use letterpress::repo::{AuthorsRepo, PgSubscriberRepo, SubscriberRepo};

use crate::auth::Publisher;
use crate::error::{RestError, RestResult};

#[derive(Debug, Serialize)]
struct NewsletterSettings {
    enabled: bool,
    send_mode: String,
    frequency: String,
    title: Option<String>,
    description: Option<String>,
    from_name: Option<String>,
    from_email: Option<String>,
    last_sent_at: Option<DateTime<Utc>>,
}

impl From<&Author> for NewsletterSettings {
    fn from(author: &Author) -> Self {
        Self {
            enabled: author.newsletter_enabled,
            send_mode: author.newsletter_send_mode.clone(),
            frequency: author.newsletter_frequency.clone(),
            title: author.newsletter_title.clone(),
            description: author.newsletter_description.clone(),
            from_name: author.newsletter_from_name.clone(),
            from_email: author.newsletter_from_email.clone(),
            last_sent_at: author.newsletter_last_sent_at,
        }
    }
}

/// Current newsletter settings plus subscriber totals
#[tracing::instrument(name = "Get newsletter settings", skip(publisher, pool))]
#[get("/settings")]
pub async fn get_settings(
    publisher: Publisher,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let pool = pool.get_ref();

    let author = AuthorsRepo::fetch_by_id(pool, publisher.id())
        .await?
        .ok_or_else(|| RestError::NotFound("Author not found".into()))?;

    let stats = PgSubscriberRepo::count_stats(pool, author.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "settings": NewsletterSettings::from(&author),
        "stats": stats,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SettingsBody {
    enabled: Option<bool>,
    send_mode: Option<String>,
    frequency: Option<String>,
    title: Option<String>,
    description: Option<String>,
    from_name: Option<String>,
    from_email: Option<String>,
}

impl TryFrom<SettingsBody> for NewsletterSettingsUpdate {
    type Error = RestError;

    fn try_from(body: SettingsBody) -> RestResult<Self> {
        if let Some(mode) = body.send_mode.as_deref() {
            mode.parse::<SendMode>().map_err(RestError::ParseError)?;
        }
        if let Some(frequency) = body.frequency.as_deref() {
            frequency
                .parse::<DigestFrequency>()
                .map_err(RestError::ParseError)?;
        }
        if let Some(from_email) = body.from_email.as_deref() {
            from_email
                .parse::<EmailAddress>()
                .map_err(RestError::ParseError)?;
        }

        Ok(Self {
            enabled: body.enabled,
            send_mode: body.send_mode,
            frequency: body.frequency,
            title: body.title,
            description: body.description,
            from_name: body.from_name,
            from_email: body.from_email,
        })
    }
}

/// Partial settings update; absent fields are left untouched
#[tracing::instrument(name = "Update newsletter settings", skip(publisher, pool))]
#[put("/settings")]
pub async fn put_settings(
    publisher: Publisher,
    body: web::Json<SettingsBody>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let pool = pool.get_ref();

    let update: NewsletterSettingsUpdate = body.into_inner().try_into()?;

    AuthorsRepo::update_newsletter_settings(pool, publisher.id(), &update).await?;

    let author = AuthorsRepo::fetch_by_id(pool, publisher.id())
        .await?
        .ok_or_else(|| RestError::NotFound("Author not found".into()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "settings": NewsletterSettings::from(&author),
    })))
}

#[derive(Debug, Deserialize)]
pub struct SubscriberQuery {
    status: Option<String>,
}

/// The authenticated author's subscriber list, optionally narrowed to
/// one status
#[tracing::instrument(name = "List subscribers", skip(publisher, pool))]
#[get("/subscribers")]
pub async fn subscribers(
    publisher: Publisher,
    query: web::Query<SubscriberQuery>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let pool = pool.get_ref();

    if let Some(status) = query.status.as_deref() {
        status
            .parse::<SubscriberStatus>()
            .map_err(RestError::ParseError)?;
    }

    let subscribers =
        PgSubscriberRepo::fetch_by_author(pool, publisher.id(), query.status.as_deref()).await?;

    Ok(HttpResponse::Ok().json(subscribers))
}
