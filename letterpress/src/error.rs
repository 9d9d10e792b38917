use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Precondition errors
    #[error("Author {0} not found")]
    AuthorNotFound(Uuid),
    #[error("Newsletter is not enabled for author {0}")]
    NewsletterDisabled(Uuid),
    #[error("Actor is not permitted to send for author {0}")]
    Forbidden(Uuid),
    // Database errors
    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),
}
