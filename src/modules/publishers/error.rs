use shop_db::DbError;
use shop_http::error::AppError;
use shop_kernel::FieldErrors;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("invalid publisher: {0}")]
    Validation(FieldErrors),

    #[error("publisher {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Storage(DbError),
}

impl From<FieldErrors> for PublisherError {
    fn from(errors: FieldErrors) -> Self {
        PublisherError::Validation(errors)
    }
}

impl From<DbError> for PublisherError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { id, .. } => PublisherError::NotFound(id),
            other => PublisherError::Storage(other),
        }
    }
}

impl From<PublisherError> for AppError {
    fn from(error: PublisherError) -> Self {
        match error {
            PublisherError::Validation(errors) => AppError::validation(errors, "Invalid publisher."),
            PublisherError::NotFound(_) => AppError::not_found("Not found."),
            PublisherError::Storage(err) => AppError::Internal(err.into()),
        }
    }
}
