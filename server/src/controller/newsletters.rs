use actix_web::dev::HttpServiceFactory;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};

use anyhow::Context;

use chrono::Utc;

use serde::{Deserialize, Serialize};

use serde_json::json;

use sqlx::PgPool;

use uuid::Uuid;

use letterpress::client::EmailClient;
use letterpress::delivery::{self, BatchPacer};
use letterpress::model::{Delivery, PostTitle};
use letterpress::repo::{DeliveriesRepo, PostsRepo};

use crate::app::{CronSecret, PublicBaseUrl};
use crate::auth::Publisher;
use crate::controller::newsletter_settings;
use crate::error::{RestError, RestResult};

#[derive(Debug, Deserialize)]
pub struct SendBody {
    author_id: Uuid,
    post_ids: Option<Vec<Uuid>>,
}

/// One manual pipeline run. Supplying `post_ids` selects manually;
/// omitting them sends every unsent published post (up to the cap)
#[tracing::instrument(
    name = "Send a newsletter now",
    skip(publisher, pool, email_client, pacer, base_url)
)]
#[post("/send")]
async fn send(
    publisher: Publisher,
    body: web::Json<SendBody>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    pacer: web::Data<BatchPacer>,
    base_url: web::Data<PublicBaseUrl>,
) -> RestResult<impl Responder> {
    let outcome = delivery::send_now(
        pool.get_ref(),
        email_client.get_ref(),
        pacer.get_ref(),
        &base_url.0,
        &publisher.actor(),
        body.author_id,
        body.post_ids.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// Scheduled entry point, authenticated by the cron shared secret
#[tracing::instrument(
    name = "Scan and send due newsletters",
    skip(req, pool, email_client, pacer, base_url, cron_secret)
)]
#[post("/scan")]
async fn scan(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    pacer: web::Data<BatchPacer>,
    base_url: web::Data<PublicBaseUrl>,
    cron_secret: web::Data<CronSecret>,
) -> RestResult<impl Responder> {
    verify_cron_secret(&req, &cron_secret)?;

    let reports = delivery::scan_and_send_due(
        pool.get_ref(),
        email_client.get_ref(),
        pacer.get_ref(),
        &base_url.0,
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Processed {} authors", reports.len()),
        "results": reports,
    })))
}

#[derive(Debug, Serialize)]
struct DeliveryHistoryEntry {
    #[serde(flatten)]
    delivery: Delivery,
    posts: Vec<PostTitle>,
}

/// The authenticated author's delivery history, newest first, with the
/// titles of the posts each send included
#[tracing::instrument(name = "List deliveries", skip(publisher, pool))]
#[get("/deliveries")]
async fn deliveries(publisher: Publisher, pool: web::Data<PgPool>) -> RestResult<impl Responder> {
    let pool = pool.get_ref();

    let deliveries = DeliveriesRepo::fetch_by_author(pool, publisher.id()).await?;

    let mut entries = Vec::with_capacity(deliveries.len());
    for delivery in deliveries {
        let posts = PostsRepo::fetch_titles_by_ids(pool, &delivery.post_ids).await?;
        entries.push(DeliveryHistoryEntry { delivery, posts });
    }

    Ok(HttpResponse::Ok().json(entries))
}

fn verify_cron_secret(req: &HttpRequest, cron_secret: &CronSecret) -> RestResult<()> {
    use secrecy::ExposeSecret;

    let presented = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .context("Missing authorization in header")
        .map_err(RestError::FailedToAuthenticate)?
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .context("Authorization scheme not bearer")
        .map_err(RestError::FailedToAuthenticate)?;

    if presented != cron_secret.0.expose_secret() {
        return Err(RestError::FailedToAuthenticate(anyhow::anyhow!(
            "Cron secret mismatch"
        )));
    }
    Ok(())
}

/// Newsletter API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/newsletters")
        .service(send)
        .service(scan)
        .service(deliveries)
        .service(newsletter_settings::get_settings)
        .service(newsletter_settings::put_settings)
        .service(newsletter_settings::subscribers)
}
