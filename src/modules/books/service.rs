use std::sync::Arc;

use shop_db::{filter::FilterError, DbError, FilterSet};
use shop_http::error::AppError;
use shop_kernel::{FieldError, FieldErrors};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::models::{Book, BookDraft};
use super::payload::{BookPayload, WriteMode};
use super::repository::BookRepository;
use super::validation::{self, Existing};

#[derive(Debug, Error)]
pub enum BookError {
    #[error("invalid book: {0}")]
    Validation(FieldErrors),

    #[error("book {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Storage(DbError),
}

impl From<FieldErrors> for BookError {
    fn from(errors: FieldErrors) -> Self {
        BookError::Validation(errors)
    }
}

impl From<FilterError> for BookError {
    fn from(error: FilterError) -> Self {
        BookError::Validation(error.into_field_errors())
    }
}

impl From<DbError> for BookError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { id, .. } => BookError::NotFound(id),
            // The store caught a duplicate the service check missed.
            DbError::UniqueViolation { field, .. } => BookError::Validation(
                std::iter::once(FieldError::new(
                    field,
                    format!("book with this {field} already exists."),
                ))
                .collect(),
            ),
            // The publisher vanished between the check and the write.
            DbError::ForeignKeyViolation { field, id, .. } => BookError::Validation(
                std::iter::once(FieldError::new(
                    field,
                    validation::missing_publisher_message(id),
                ))
                .collect(),
            ),
            other => BookError::Storage(other),
        }
    }
}

impl From<BookError> for AppError {
    fn from(error: BookError) -> Self {
        match error {
            BookError::Validation(errors) => AppError::validation(errors, "Invalid book."),
            BookError::NotFound(_) => AppError::not_found("Not found."),
            BookError::Storage(err) => AppError::Internal(err.into()),
        }
    }
}

/// Validates and persists books.
#[derive(Clone)]
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    /// Books matching the query parameters, in insertion order.
    pub async fn list<I, K, V>(&self, params: I) -> Result<Vec<Book>, BookError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let filter = FilterSet::parse::<Book, _, _, _>(params)?;
        Ok(self.repository.list(&filter).await?)
    }

    pub async fn retrieve(&self, id: Uuid) -> Result<Book, BookError> {
        self.repository
            .get(id)
            .await?
            .ok_or(BookError::NotFound(id))
    }

    pub async fn create(&self, payload: BookPayload) -> Result<Book, BookError> {
        let draft = payload.merge(None);
        self.check(&payload, WriteMode::Create, &draft, None).await?;

        let book = Book {
            id: Uuid::new_v4(),
            title: required_title(draft.title)?,
            price: draft.price,
            publisher_id: draft.publisher_id,
            created_at: OffsetDateTime::now_utc(),
        };

        let book = self.repository.insert(book).await?;
        tracing::info!(book_id = %book.id, "registered book {}", book.id);
        Ok(book)
    }

    /// Full (`partial == false`) or partial update of the book stored at `id`.
    pub async fn update(
        &self,
        id: Uuid,
        payload: BookPayload,
        partial: bool,
    ) -> Result<Book, BookError> {
        let current = self.retrieve(id).await?;
        self.apply_update(current, payload, partial).await
    }

    /// Update `current`, a book already read from the repository.
    pub async fn apply_update(
        &self,
        current: Book,
        payload: BookPayload,
        partial: bool,
    ) -> Result<Book, BookError> {
        let id = current.id;
        let mode = if partial {
            WriteMode::Partial
        } else {
            WriteMode::Replace
        };

        let draft = payload.merge(Some(&current));
        self.check(&payload, mode, &draft, Some(id)).await?;

        let book = Book {
            title: required_title(draft.title)?,
            price: draft.price,
            publisher_id: draft.publisher_id,
            ..current
        };

        let book = self.repository.update(book).await?;
        tracing::info!(book_id = %book.id, partial, "updated book");
        Ok(book)
    }

    /// Remove a book. Deleting an id that is already gone is `NotFound`.
    pub async fn delete(&self, id: Uuid) -> Result<(), BookError> {
        let book = self.repository.delete(id).await?;
        tracing::info!(book_id = %book.id, "deleted book");
        Ok(())
    }

    /// Shape errors first, then the rule pipeline against every other book.
    async fn check(
        &self,
        payload: &BookPayload,
        mode: WriteMode,
        draft: &BookDraft,
        updating: Option<Uuid>,
    ) -> Result<(), BookError> {
        let mut errors: FieldErrors = payload.shape_errors(mode).into_iter().collect();

        let others: Vec<Book> = self
            .repository
            .list(&FilterSet::all())
            .await?
            .into_iter()
            .filter(|book| Some(book.id) != updating)
            .collect();

        let publisher_exists = match draft.publisher_id {
            Some(publisher_id) => self.repository.publisher_exists(publisher_id).await?,
            None => true,
        };

        let existing = Existing {
            others: &others,
            publisher_exists,
        };
        errors.merge(validation::validate(draft, &existing));

        errors.into_result(()).map_err(BookError::Validation)
    }
}

/// A draft that passed validation always has a title.
fn required_title(title: Option<String>) -> Result<String, BookError> {
    title.ok_or_else(|| {
        BookError::Validation(
            std::iter::once(FieldError::new("title", crate::utils::REQUIRED)).collect(),
        )
    })
}
