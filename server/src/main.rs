use std::net::TcpListener;

use anyhow::Context;

use sqlx::PgPool;

use server::app;
use server::settings::Settings;
use server::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber("info".into(), std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let settings = Settings::load().expect("Failed to load settings");

    let pool = PgPool::connect_with(settings.database.with_db()).await?;

    let listener = TcpListener::bind(settings.app.addr())?;

    let email_client = settings.email.client()?;

    app::run(
        listener,
        pool,
        email_client,
        settings.app.base_url(),
        settings.app.cron_secret().clone(),
    )?
    .await
    .context("Failed to run app")
}
