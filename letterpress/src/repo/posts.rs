use chrono::{DateTime, Utc};

use sqlx::PgExecutor;

use uuid::Uuid;

use crate::model::{NewPost, Post, PostTitle};

const POST_COLUMNS: &str = "id, author_id, title, slug, status, published_at, \
     newsletter_sent_at, created_at, updated_at, deleted_at";

pub struct PostsRepo;

impl PostsRepo {
    #[tracing::instrument("Insert a new post record", skip(executor))]
    pub async fn insert<'conn>(
        executor: impl PgExecutor<'conn>,
        new_post: &NewPost,
    ) -> sqlx::Result<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "insert into posts(author_id, title, slug, status, published_at) \
             values ($1, $2, $3, $4, $5) returning id",
        )
        .bind(new_post.author_id)
        .bind(&new_post.title)
        .bind(&new_post.slug)
        .bind(&new_post.status)
        .bind(new_post.published_at)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    #[tracing::instrument("Fetch a post by id", skip(executor))]
    pub async fn fetch_by_id<'conn>(
        executor: impl PgExecutor<'conn>,
        id: Uuid,
    ) -> sqlx::Result<Option<Post>> {
        sqlx::query_as(&format!("select {} from posts where id=$1", POST_COLUMNS))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Published, live posts out of an explicit id set. Drafts, scheduled
    /// posts and tombstoned rows fall out silently; already-sent posts
    /// stay in (manual resend is allowed)
    #[tracing::instrument("Fetch published posts by ids", skip(executor))]
    pub async fn fetch_published_by_ids<'conn>(
        executor: impl PgExecutor<'conn>,
        ids: &[Uuid],
    ) -> sqlx::Result<Vec<Post>> {
        sqlx::query_as(&format!(
            "select {} from posts \
             where id=any($1) and status='published' and deleted_at is null \
             order by published_at desc",
            POST_COLUMNS
        ))
        .bind(ids)
        .fetch_all(executor)
        .await
    }

    /// Published posts not yet delivered in any newsletter, newest first
    #[tracing::instrument("Fetch unsent published posts", skip(executor))]
    pub async fn fetch_unsent_published<'conn>(
        executor: impl PgExecutor<'conn>,
        author_id: Uuid,
        limit: i64,
    ) -> sqlx::Result<Vec<Post>> {
        sqlx::query_as(&format!(
            "select {} from posts \
             where author_id=$1 and status='published' \
             and newsletter_sent_at is null and deleted_at is null \
             order by published_at desc limit $2",
            POST_COLUMNS
        ))
        .bind(author_id)
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    #[tracing::instrument("Fetch post titles by ids", skip(executor))]
    pub async fn fetch_titles_by_ids<'conn>(
        executor: impl PgExecutor<'conn>,
        ids: &[Uuid],
    ) -> sqlx::Result<Vec<PostTitle>> {
        sqlx::query_as("select id, title, slug from posts where id=any($1)")
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// Stamp the delivery guard on every post included in a completed send
    #[tracing::instrument("Mark posts as sent", skip(executor))]
    pub async fn mark_sent<'conn>(
        executor: impl PgExecutor<'conn>,
        ids: &[Uuid],
        sent_at: DateTime<Utc>,
    ) -> sqlx::Result<()> {
        sqlx::query("update posts set newsletter_sent_at=$2 where id=any($1)")
            .bind(ids)
            .bind(sent_at)
            .execute(executor)
            .await?;
        Ok(())
    }
}
