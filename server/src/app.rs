use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use secrecy::Secret;

use sqlx::PgPool;

use tracing_actix_web::TracingLogger;

use url::Url;

use letterpress::client::EmailClient;
use letterpress::delivery::BatchPacer;

use crate::controller::{newsletters, subscriptions};

/// Public origin used when rendering links in outgoing mail
#[derive(Debug, Clone)]
pub struct PublicBaseUrl(pub Url);

/// Shared secret the external scheduler must present to trigger a scan
#[derive(Clone)]
pub struct CronSecret(pub Secret<String>);

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("I am alive")
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    pool: PgPool,
    email_client: EmailClient,
    base_url: Url,
    cron_secret: Secret<String>,
) -> anyhow::Result<Server> {
    // Wrap application data
    let pool = web::Data::new(pool);
    let email_client = web::Data::new(email_client);
    let pacer = web::Data::new(BatchPacer::default());
    let base_url = web::Data::new(PublicBaseUrl(base_url));
    let cron_secret = web::Data::new(CronSecret(cron_secret));

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(pool.clone())
            .app_data(email_client.clone())
            .app_data(pacer.clone())
            .app_data(base_url.clone())
            .app_data(cron_secret.clone())
            .service(health_check)
            .service(subscriptions::scope())
            .service(newsletters::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
