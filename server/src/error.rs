use actix_web::http::StatusCode;
use actix_web::ResponseError;

use thiserror::Error;

pub type RestResult<T> = Result<T, RestError>;

// TODO: I18n for errors
#[derive(Debug, Error)]
pub enum RestError {
    #[error("Parse Error: {0}")]
    ParseError(String),

    #[error("Unauthorized Access")]
    FailedToAuthenticate(#[source] anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Precondition Failed: {0}")]
    PreconditionFailed(String),

    #[error("Internal Server Error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RestError {
    fn from(_e: sqlx::Error) -> Self {
        Self::InternalError("Database error".into())
    }
}

impl From<letterpress::error::Error> for RestError {
    fn from(e: letterpress::error::Error) -> Self {
        use letterpress::error::Error as E;
        match e {
            E::AuthorNotFound(_) => Self::NotFound("Author not found".into()),
            E::NewsletterDisabled(_) => {
                Self::PreconditionFailed("Newsletter is not enabled for this author".into())
            }
            E::Forbidden(_) => Self::Forbidden("Not permitted for this newsletter".into()),
            E::DatabaseError(_) => Self::InternalError("Database error".into()),
        }
    }
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ParseError(_) | Self::PreconditionFailed(_) => StatusCode::BAD_REQUEST,
            Self::FailedToAuthenticate(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InternalError(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
