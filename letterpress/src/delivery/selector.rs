use sqlx::PgExecutor;

use uuid::Uuid;

use crate::model::Post;
use crate::repo::PostsRepo;

/// Cap on posts per automatic digest send
pub const AUTO_SELECT_CAP: i64 = 10;

/// Choose the posts for one send.
///
/// A caller-supplied, non-empty id set selects manually: still-published,
/// live posts out of that set, already-sent ones included (manual resend
/// is allowed). Otherwise selection is automatic: published posts never
/// delivered in a newsletter, newest first, capped.
///
/// An empty result is not an error; it means there is nothing to send.
#[tracing::instrument("Select posts for send", skip(executor))]
pub async fn select_posts<'conn>(
    executor: impl PgExecutor<'conn>,
    author_id: Uuid,
    post_ids: Option<&[Uuid]>,
) -> sqlx::Result<Vec<Post>> {
    match post_ids {
        Some(ids) if !ids.is_empty() => PostsRepo::fetch_published_by_ids(executor, ids).await,
        _ => PostsRepo::fetch_unsent_published(executor, author_id, AUTO_SELECT_CAP).await,
    }
}
