use async_trait::async_trait;
use shop_db::{DbError, FilterSet};
use uuid::Uuid;

use super::models::Book;

/// Storage the book service depends on.
///
/// Implementations must enforce the title unique constraint on every
/// write; the service's own check is advisory.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Books matching `filter`, in insertion order.
    async fn list(&self, filter: &FilterSet) -> Result<Vec<Book>, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<Book>, DbError>;

    async fn insert(&self, book: Book) -> Result<Book, DbError>;

    async fn update(&self, book: Book) -> Result<Book, DbError>;

    async fn delete(&self, id: Uuid) -> Result<Book, DbError>;

    async fn publisher_exists(&self, id: Uuid) -> Result<bool, DbError>;
}
