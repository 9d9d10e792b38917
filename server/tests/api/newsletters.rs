use reqwest::StatusCode;

use serde_json::json;

use sqlx::PgPool;

use uuid::Uuid;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{
    seed_active_subscriber, seed_pending_subscriber, seed_post, TestApp, TestAuthor, CRON_SECRET,
};

async fn mount_accepting_email_mock(app: &TestApp, expected: u64) {
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected)
        .mount(&app.email_server)
        .await;
}

async fn delivery_count(pool: &PgPool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("select count(*) from deliveries")
        .fetch_one(pool)
        .await
        .expect("Failed to count deliveries");
    count
}

#[sqlx::test(migrations = "../migrations")]
async fn automatic_send_delivers_to_every_active_subscriber(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    for slug in ["one", "two", "three"] {
        seed_post(&pool, author.id, slug, "published").await;
    }
    seed_active_subscriber(&pool, author.id, "first@example.com").await;
    seed_active_subscriber(&pool, author.id, "second@example.com").await;

    mount_accepting_email_mock(&app, 2).await;

    let res = app
        .newsletter_send(Some(&author.credentials()), &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("sent", body["result"]);
    assert_eq!(2, body["sent_count"]);
    assert_eq!(0, body["failed_count"]);

    // One audit row capturing all three posts and both recipients
    let (status, subscriber_count, post_ids): (String, i32, Vec<Uuid>) =
        sqlx::query_as("select status, subscriber_count, post_ids from deliveries")
            .fetch_one(&pool)
            .await?;
    assert_eq!("completed", status);
    assert_eq!(2, subscriber_count);
    assert_eq!(3, post_ids.len());

    // Every post is stamped, the author's marker advanced
    let (unstamped,): (i64,) =
        sqlx::query_as("select count(*) from posts where newsletter_sent_at is null")
            .fetch_one(&pool)
            .await?;
    assert_eq!(0, unstamped);

    let (last_sent,): (Option<chrono::DateTime<chrono::Utc>>,) =
        sqlx::query_as("select newsletter_last_sent_at from authors where id=$1")
            .bind(author.id)
            .fetch_one(&pool)
            .await?;
    assert!(last_sent.is_some());

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn disabled_newsletter_is_a_precondition_error(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register(&pool, "writer@example.com", "writer", "secret").await;

    let res = app
        .newsletter_send(Some(&author.credentials()), &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
    assert_eq!(0, delivery_count(&pool).await);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn manual_send_silently_drops_draft_posts(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    let published = seed_post(&pool, author.id, "one", "published").await;
    let draft = seed_post(&pool, author.id, "two", "draft").await;
    seed_active_subscriber(&pool, author.id, "reader@example.com").await;

    mount_accepting_email_mock(&app, 1).await;

    let res = app
        .newsletter_send(
            Some(&author.credentials()),
            &json!({ "author_id": author.id, "post_ids": [published, draft] }),
        )
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let (post_ids,): (Vec<Uuid>,) = sqlx::query_as("select post_ids from deliveries")
        .fetch_one(&pool)
        .await?;
    assert_eq!(vec![published], post_ids);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn no_active_subscribers_skips_without_a_record(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    for slug in ["one", "two", "three", "four", "five"] {
        seed_post(&pool, author.id, slug, "published").await;
    }
    // Pending subscribers do not count
    seed_pending_subscriber(&pool, author.id, "pending@example.com").await;

    mount_accepting_email_mock(&app, 0).await;

    let res = app
        .newsletter_send(Some(&author.credentials()), &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("skipped", body["result"]);
    assert_eq!("no_active_subscribers", body["reason"]);

    assert_eq!(0, delivery_count(&pool).await);

    // Posts stay eligible for a later run
    let (unsent,): (i64,) =
        sqlx::query_as("select count(*) from posts where newsletter_sent_at is null")
            .fetch_one(&pool)
            .await?;
    assert_eq!(5, unsent);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn nothing_unsent_skips_without_a_record(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    seed_active_subscriber(&pool, author.id, "reader@example.com").await;

    let res = app
        .newsletter_send(Some(&author.credentials()), &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("skipped", body["result"]);
    assert_eq!("no_unsent_posts", body["reason"]);
    assert_eq!(0, delivery_count(&pool).await);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn posts_are_never_redelivered_automatically(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    seed_post(&pool, author.id, "one", "published").await;
    seed_active_subscriber(&pool, author.id, "reader@example.com").await;

    mount_accepting_email_mock(&app, 1).await;

    let res = app
        .newsletter_send(Some(&author.credentials()), &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());

    // The same run again finds nothing to send
    let res = app
        .newsletter_send(Some(&author.credentials()), &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("skipped", body["result"]);

    assert_eq!(1, delivery_count(&pool).await);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn unsubscribed_subscribers_receive_no_mail(pool: PgPool) -> sqlx::Result<()> {
    use chrono::Utc;
    use letterpress::repo::{PgSubscriberRepo, SubscriberRepo};

    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    seed_post(&pool, author.id, "one", "published").await;

    seed_active_subscriber(&pool, author.id, "reader@example.com").await;
    let gone = seed_active_subscriber(&pool, author.id, "gone@example.com").await;
    PgSubscriberRepo::unsubscribe(&pool, gone, Utc::now())
        .await
        .expect("Failed to unsubscribe");
    seed_pending_subscriber(&pool, author.id, "pending@example.com").await;

    // Exactly one message: the remaining active subscriber
    mount_accepting_email_mock(&app, 1).await;

    let res = app
        .newsletter_send(Some(&author.credentials()), &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!(1, body["sent_count"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn failed_recipients_are_recorded_and_posts_still_stamped(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    seed_post(&pool, author.id, "one", "published").await;
    seed_active_subscriber(&pool, author.id, "first@example.com").await;
    seed_active_subscriber(&pool, author.id, "second@example.com").await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let res = app
        .newsletter_send(Some(&author.credentials()), &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("sent", body["result"]);
    assert_eq!(0, body["sent_count"]);
    assert_eq!(2, body["failed_count"]);

    let (status, subscriber_count, sent_count, failed_count, error_detail): (
        String,
        i32,
        i32,
        i32,
        Option<String>,
    ) = sqlx::query_as(
        "select status, subscriber_count, sent_count, failed_count, error_detail from deliveries",
    )
    .fetch_one(&pool)
    .await?;

    assert_eq!("completed", status);
    assert_eq!(subscriber_count, sent_count + failed_count);
    assert!(error_detail.is_some());

    // Failed recipients do not keep the posts eligible
    let (unstamped,): (i64,) =
        sqlx::query_as("select count(*) from posts where newsletter_sent_at is null")
            .fetch_one(&pool)
            .await?;
    assert_eq!(0, unstamped);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn send_requires_credentials(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;

    let res = app
        .newsletter_send(None, &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::UNAUTHORIZED, res.status());

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn authors_cannot_send_for_other_authors(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;
    let other = TestAuthor::register(&pool, "other@example.com", "other", "secret").await;

    let res = app
        .newsletter_send(Some(&other.credentials()), &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn admins_can_send_for_any_author(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let author = TestAuthor::register_with_newsletter(&pool).await;
    let admin = TestAuthor::register(&pool, "admin@example.com", "admin", "secret").await;
    admin.promote_to_admin(&pool).await;

    let res = app
        .newsletter_send(Some(&admin.credentials()), &json!({ "author_id": author.id }))
        .await
        .expect("Failed to execute request");

    // Nothing staged for this author, but authorization held
    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("skipped", body["result"]);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn scan_requires_the_cron_secret(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .newsletter_scan(None)
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::UNAUTHORIZED, res.status());

    let res = app
        .newsletter_scan(Some("wrong-secret"))
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::UNAUTHORIZED, res.status());

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn scan_sends_for_due_authors_and_skips_the_rest(pool: PgPool) -> sqlx::Result<()> {
    use chrono::Utc;

    let app = TestApp::spawn(&pool).await;

    // Never sent: due immediately
    let due = TestAuthor::register_with_newsletter(&pool).await;
    seed_post(&pool, due.id, "one", "published").await;
    seed_active_subscriber(&pool, due.id, "reader@example.com").await;

    // Sent just now: daily frequency keeps it quiet
    let quiet = TestAuthor::register(&pool, "quiet@example.com", "quiet", "secret").await;
    quiet.enable_newsletter(&pool).await;
    quiet.set_last_sent(&pool, Utc::now()).await;

    mount_accepting_email_mock(&app, 1).await;

    let res = app
        .newsletter_scan(Some(CRON_SECRET))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");

    let results = body["results"].as_array().expect("Missing results");
    assert_eq!(2, results.len());

    let by_author = |id: Uuid| {
        results
            .iter()
            .find(|r| r["author_id"] == json!(id))
            .expect("Missing author entry")
    };

    assert_eq!("sent", by_author(due.id)["outcome"]["result"]);
    assert_eq!("skipped", by_author(quiet.id)["outcome"]["result"]);
    assert_eq!("not_due", by_author(quiet.id)["outcome"]["reason"]);

    assert_eq!(1, delivery_count(&pool).await);

    Ok(())
}

#[sqlx::test(migrations = "../migrations")]
async fn a_second_scan_does_not_redeliver(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let author = TestAuthor::register_with_newsletter(&pool).await;
    seed_post(&pool, author.id, "one", "published").await;
    seed_active_subscriber(&pool, author.id, "reader@example.com").await;

    mount_accepting_email_mock(&app, 1).await;

    let res = app
        .newsletter_scan(Some(CRON_SECRET))
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());

    // The follow-up scan finds the author not due (and nothing unsent)
    let res = app
        .newsletter_scan(Some(CRON_SECRET))
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!(
        "skipped",
        body["results"][0]["outcome"]["result"],
        "second scan must not send again"
    );

    assert_eq!(1, delivery_count(&pool).await);

    Ok(())
}
