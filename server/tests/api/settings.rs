use reqwest::StatusCode;

use serde_json::json;

use sqlx::PgPool;

use crate::helpers::{seed_active_subscriber, seed_pending_subscriber, TestApp, TestAuthor};

#[sqlx::test(migrations = "../migrations")]
async fn settings_include_subscriber_stats(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    seed_active_subscriber(&pool, author.id, "active@example.com").await;
    seed_pending_subscriber(&pool, author.id, "pending@example.com").await;

    let res = app
        .get_settings(Some(&author.credentials()))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");

    assert_eq!(true, body["settings"]["enabled"]);
    assert_eq!("daily", body["settings"]["frequency"]);
    assert_eq!(2, body["stats"]["total"]);
    assert_eq!(1, body["stats"]["active"]);
    assert_eq!(1, body["stats"]["pending"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn settings_require_credentials(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .get_settings(None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::UNAUTHORIZED, res.status());

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn partial_updates_keep_other_fields(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    let res = app
        .put_settings(
            Some(&author.credentials()),
            &json!({ "frequency": "weekly", "title": "The Weekly Dispatch" }),
        )
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");

    assert_eq!("weekly", body["settings"]["frequency"]);
    assert_eq!("The Weekly Dispatch", body["settings"]["title"]);
    // Untouched by this update
    assert_eq!(true, body["settings"]["enabled"]);
    assert_eq!("digest", body["settings"]["send_mode"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn invalid_settings_values_are_rejected(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    let test_cases = vec![
        ("bad send mode", json!({ "send_mode": "broadcast" })),
        ("bad frequency", json!({ "frequency": "fortnightly" })),
        ("bad from address", json!({ "from_email": "not an address" })),
    ];

    for (test_name, body) in test_cases {
        let res = app
            .put_settings(Some(&author.credentials()), &body)
            .await
            .expect("Failed to execute request");

        assert_eq!(StatusCode::BAD_REQUEST, res.status(), "{}", test_name);
    }

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn subscriber_listing_can_filter_by_status(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    seed_active_subscriber(&pool, author.id, "active@example.com").await;
    seed_pending_subscriber(&pool, author.id, "pending@example.com").await;

    let res = app
        .subscribers(Some(&author.credentials()), None)
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!(2, body.as_array().unwrap().len());

    let res = app
        .subscribers(Some(&author.credentials()), Some("pending"))
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!(1, body.as_array().unwrap().len());
    assert_eq!("pending@example.com", body[0]["email"]);

    // Unknown status filters are rejected
    let res = app
        .subscribers(Some(&author.credentials()), Some("vanished"))
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::BAD_REQUEST, res.status());

    Ok(())
}
