//! In-memory store backing both the books and publishers modules.

use async_trait::async_trait;
use shop_db::{DbError, FilterSet, Record, Table};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::modules::books::{models::Book, repository::BookRepository};
use crate::modules::publishers::{models::Publisher, repository::PublisherRepository};

/// Both tables plus the book to publisher foreign key.
///
/// Book writes and publisher deletes hold `references` for their whole
/// check-then-write sequence, always before any table lock, so a book can
/// never be stored pointing at a publisher that is being removed.
#[derive(Default)]
pub struct ShopStore {
    books: Table<Book>,
    publishers: Table<Publisher>,
    references: Mutex<()>,
}

impl ShopStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callers must hold `references`.
    async fn check_publisher(&self, book: &Book) -> Result<(), DbError> {
        match book.publisher_id {
            Some(id) if !self.publishers.contains(id).await => Err(DbError::ForeignKeyViolation {
                table: Book::TABLE,
                field: "publisher_id",
                id,
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl BookRepository for ShopStore {
    async fn list(&self, filter: &FilterSet) -> Result<Vec<Book>, DbError> {
        Ok(self.books.filter(filter).await)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Book>, DbError> {
        Ok(self.books.get(id).await)
    }

    async fn insert(&self, book: Book) -> Result<Book, DbError> {
        let _references = self.references.lock().await;
        self.check_publisher(&book).await?;
        self.books.insert(book).await
    }

    async fn update(&self, book: Book) -> Result<Book, DbError> {
        let _references = self.references.lock().await;
        self.check_publisher(&book).await?;
        self.books.update(book).await
    }

    async fn delete(&self, id: Uuid) -> Result<Book, DbError> {
        self.books.delete(id).await
    }

    async fn publisher_exists(&self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.publishers.contains(id).await)
    }
}

#[async_trait]
impl PublisherRepository for ShopStore {
    async fn list(&self) -> Result<Vec<Publisher>, DbError> {
        Ok(self.publishers.all().await)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Publisher>, DbError> {
        Ok(self.publishers.get(id).await)
    }

    async fn insert(&self, publisher: Publisher) -> Result<Publisher, DbError> {
        self.publishers.insert(publisher).await
    }

    async fn delete(&self, id: Uuid) -> Result<(Publisher, usize), DbError> {
        let _references = self.references.lock().await;
        let publisher = self.publishers.delete(id).await?;
        let detached = self
            .books
            .update_where(
                |book| book.publisher_id == Some(id),
                |book| book.publisher_id = None,
            )
            .await;
        Ok((publisher, detached))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn book(title: &str, publisher_id: Option<Uuid>) -> Book {
        Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            price: Some(1000),
            publisher_id,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn deleting_a_publisher_detaches_its_books() {
        let store = ShopStore::new();
        let kept = PublisherRepository::insert(&store, Publisher::new("Kept")).await.unwrap();
        let gone = PublisherRepository::insert(&store, Publisher::new("Gone")).await.unwrap();

        let a = BookRepository::insert(&store, book("A", Some(gone.id))).await.unwrap();
        let b = BookRepository::insert(&store, book("B", Some(kept.id))).await.unwrap();
        let c = BookRepository::insert(&store, book("C", Some(gone.id))).await.unwrap();

        let (removed, detached) = PublisherRepository::delete(&store, gone.id).await.unwrap();
        assert_eq!(removed.id, gone.id);
        assert_eq!(detached, 2);

        let books = BookRepository::list(&store, &FilterSet::all()).await.unwrap();
        assert_eq!(
            books.iter().map(|book| book.id).collect::<Vec<_>>(),
            vec![a.id, b.id, c.id]
        );
        assert_eq!(books[0].publisher_id, None);
        assert_eq!(books[1].publisher_id, Some(kept.id));
        assert_eq!(books[2].publisher_id, None);
        assert!(!store.publisher_exists(gone.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_missing_publisher_is_not_found() {
        let store = ShopStore::new();
        let result = PublisherRepository::delete(&store, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DbError::NotFound { table: "publisher", .. })));
    }

    #[tokio::test]
    async fn book_writes_cannot_reference_a_deleted_publisher() {
        let store = ShopStore::new();
        let publisher = PublisherRepository::insert(&store, Publisher::new("Gone")).await.unwrap();
        let existing = BookRepository::insert(&store, book("Existing", None)).await.unwrap();

        // The service saw the publisher, then it was deleted before the write.
        assert!(store.publisher_exists(publisher.id).await.unwrap());
        PublisherRepository::delete(&store, publisher.id).await.unwrap();

        let inserted = BookRepository::insert(&store, book("Late", Some(publisher.id))).await;
        assert_eq!(
            inserted.unwrap_err(),
            DbError::ForeignKeyViolation {
                table: "book",
                field: "publisher_id",
                id: publisher.id,
            }
        );

        let updated = BookRepository::update(
            &store,
            Book {
                publisher_id: Some(publisher.id),
                ..existing.clone()
            },
        )
        .await;
        assert!(matches!(updated, Err(DbError::ForeignKeyViolation { .. })));

        let books = BookRepository::list(&store, &FilterSet::all()).await.unwrap();
        assert_eq!(books, vec![existing]);
    }

    #[tokio::test]
    async fn concurrent_delete_and_insert_never_leave_a_dangling_reference() {
        for _ in 0..50 {
            let store = std::sync::Arc::new(ShopStore::new());
            let publisher_id = PublisherRepository::insert(store.as_ref(), Publisher::new("Racy"))
                .await
                .unwrap()
                .id;

            let deleting = {
                let store = store.clone();
                tokio::spawn(async move { PublisherRepository::delete(store.as_ref(), publisher_id).await })
            };
            let inserting = {
                let store = store.clone();
                tokio::spawn(async move {
                    BookRepository::insert(store.as_ref(), book("Racy", Some(publisher_id))).await
                })
            };
            deleting.await.unwrap().unwrap();
            let _ = inserting.await.unwrap();

            let books = BookRepository::list(store.as_ref(), &FilterSet::all()).await.unwrap();
            assert!(books.iter().all(|book| book.publisher_id.is_none()));
        }
    }

    #[tokio::test]
    async fn store_rejects_duplicate_titles() {
        let store = ShopStore::new();
        BookRepository::insert(&store, book("Same", None)).await.unwrap();
        let result = BookRepository::insert(&store, book("Same", None)).await;
        assert!(matches!(result, Err(DbError::UniqueViolation { field: "title", .. })));
    }
}
