use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::DbError;
use crate::filter::{FilterSet, Filterable};

/// One value a row contributes to a unique constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    /// Constraint name, reported back on violation.
    pub constraint: &'static str,
    /// Field blamed for the violation.
    pub field: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(constraint: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self {
            constraint,
            field,
            value: value.into(),
        }
    }
}

/// A row type that can live in a [`Table`].
pub trait Record: Clone + Send + Sync + 'static {
    /// Table name used in errors and logs.
    const TABLE: &'static str;

    fn id(&self) -> Uuid;

    /// Keys that must not repeat across rows. A row that omits a key (for
    /// instance because a column is null) does not take part in that
    /// constraint.
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }
}

/// In-memory table keeping rows in insertion order.
///
/// Every write takes the table's write lock for the whole
/// check-then-modify sequence, so unique constraints hold even when the
/// application-level checks race.
pub struct Table<R> {
    rows: RwLock<Vec<R>>,
}

impl<R: Record> Table<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of every row in insertion order.
    pub async fn all(&self) -> Vec<R> {
        self.rows.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    pub async fn get(&self, id: Uuid) -> Option<R> {
        self.rows.read().await.iter().find(|row| row.id() == id).cloned()
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.rows.read().await.iter().any(|row| row.id() == id)
    }

    /// Rows matching `predicate`, in insertion order.
    pub async fn find<P>(&self, predicate: P) -> Vec<R>
    where
        P: Fn(&R) -> bool,
    {
        self.rows
            .read()
            .await
            .iter()
            .filter(|row| predicate(*row))
            .cloned()
            .collect()
    }

    /// Rows satisfying every criterion of `filter`, in insertion order.
    pub async fn filter(&self, filter: &FilterSet) -> Vec<R>
    where
        R: Filterable,
    {
        self.find(|row| filter.matches(row)).await
    }

    pub async fn insert(&self, row: R) -> Result<R, DbError> {
        let mut rows = self.rows.write().await;

        if rows.iter().any(|existing| existing.id() == row.id()) {
            return Err(DbError::DuplicateKey {
                table: R::TABLE,
                id: row.id(),
            });
        }
        check_unique(&rows, &row)?;

        rows.push(row.clone());
        tracing::debug!(table = R::TABLE, id = %row.id(), "row inserted");
        Ok(row)
    }

    /// Replace the row sharing `row`'s id, keeping its position.
    pub async fn update(&self, row: R) -> Result<R, DbError> {
        let mut rows = self.rows.write().await;

        let position = rows
            .iter()
            .position(|existing| existing.id() == row.id())
            .ok_or(DbError::NotFound {
                table: R::TABLE,
                id: row.id(),
            })?;
        check_unique(&rows, &row)?;

        rows[position] = row.clone();
        tracing::debug!(table = R::TABLE, id = %row.id(), "row updated");
        Ok(row)
    }

    pub async fn delete(&self, id: Uuid) -> Result<R, DbError> {
        let mut rows = self.rows.write().await;

        let position = rows
            .iter()
            .position(|existing| existing.id() == id)
            .ok_or(DbError::NotFound {
                table: R::TABLE,
                id,
            })?;

        let removed = rows.remove(position);
        tracing::debug!(table = R::TABLE, %id, "row deleted");
        Ok(removed)
    }

    /// Apply `change` to every row matching `predicate`, returning how many
    /// rows were touched. `change` must not alter unique keys.
    pub async fn update_where<P, F>(&self, predicate: P, mut change: F) -> usize
    where
        P: Fn(&R) -> bool,
        F: FnMut(&mut R),
    {
        let mut rows = self.rows.write().await;
        let mut touched = 0;
        for row in rows.iter_mut() {
            if predicate(row) {
                change(row);
                touched += 1;
            }
        }
        touched
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_unique<R: Record>(rows: &[R], candidate: &R) -> Result<(), DbError> {
    let keys = candidate.unique_keys();
    if keys.is_empty() {
        return Ok(());
    }

    for other in rows.iter().filter(|other| other.id() != candidate.id()) {
        let other_keys = other.unique_keys();
        for key in &keys {
            let clash = other_keys
                .iter()
                .any(|theirs| theirs.constraint == key.constraint && theirs.value == key.value);
            if clash {
                return Err(DbError::UniqueViolation {
                    table: R::TABLE,
                    constraint: key.constraint,
                    field: key.field,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tag {
        id: Uuid,
        label: String,
        group: Option<Uuid>,
    }

    impl Tag {
        fn new(label: &str) -> Self {
            Self {
                id: Uuid::new_v4(),
                label: label.to_string(),
                group: None,
            }
        }
    }

    impl Record for Tag {
        const TABLE: &'static str = "tag";

        fn id(&self) -> Uuid {
            self.id
        }

        fn unique_keys(&self) -> Vec<UniqueKey> {
            vec![UniqueKey::new("tag_label_unique", "label", self.label.clone())]
        }
    }

    #[tokio::test]
    async fn insert_keeps_insertion_order() {
        let table = Table::new();
        let first = table.insert(Tag::new("b")).await.unwrap();
        let second = table.insert(Tag::new("a")).await.unwrap();

        let ids: Vec<Uuid> = table.all().await.iter().map(|tag| tag.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_unique_key() {
        let table = Table::new();
        table.insert(Tag::new("rust")).await.unwrap();

        let err = table.insert(Tag::new("rust")).await.unwrap_err();
        assert_eq!(
            err,
            DbError::UniqueViolation {
                table: "tag",
                constraint: "tag_label_unique",
                field: "label",
            }
        );
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn update_may_keep_its_own_unique_value() {
        let table = Table::new();
        let mut tag = table.insert(Tag::new("rust")).await.unwrap();
        tag.group = Some(Uuid::new_v4());

        let updated = table.update(tag.clone()).await.unwrap();
        assert_eq!(updated, tag);
        assert_eq!(table.get(tag.id).await, Some(tag));
    }

    #[tokio::test]
    async fn update_rejects_taking_another_rows_value() {
        let table = Table::new();
        table.insert(Tag::new("rust")).await.unwrap();
        let mut other = table.insert(Tag::new("go")).await.unwrap();
        other.label = "rust".to_string();

        assert!(matches!(
            table.update(other).await,
            Err(DbError::UniqueViolation { field: "label", .. })
        ));
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let table = Table::new();
        let tag = table.insert(Tag::new("rust")).await.unwrap();

        assert_eq!(table.delete(tag.id).await.unwrap(), tag);
        assert_eq!(
            table.delete(tag.id).await,
            Err(DbError::NotFound {
                table: "tag",
                id: tag.id,
            })
        );
    }

    #[tokio::test]
    async fn update_where_touches_only_matching_rows() {
        let table = Table::new();
        let group = Uuid::new_v4();
        let mut grouped = Tag::new("a");
        grouped.group = Some(group);
        table.insert(grouped).await.unwrap();
        table.insert(Tag::new("b")).await.unwrap();

        let touched = table
            .update_where(|tag| tag.group == Some(group), |tag| tag.group = None)
            .await;

        assert_eq!(touched, 1);
        assert!(table.find(|tag| tag.group.is_some()).await.is_empty());
    }
}
