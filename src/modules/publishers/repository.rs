use async_trait::async_trait;
use shop_db::DbError;
use uuid::Uuid;

use super::models::Publisher;

/// Storage the publishers module depends on.
#[async_trait]
pub trait PublisherRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Publisher>, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<Publisher>, DbError>;

    async fn insert(&self, publisher: Publisher) -> Result<Publisher, DbError>;

    /// Delete a publisher and clear every book reference to it.
    /// Returns the removed publisher and the number of books detached.
    async fn delete(&self, id: Uuid) -> Result<(Publisher, usize), DbError>;
}
