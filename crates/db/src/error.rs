use thiserror::Error;
use uuid::Uuid;

/// Errors reported by the storage layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DbError {
    /// No row with the given id exists in the table.
    #[error("no row with id {id} in table '{table}'")]
    NotFound { table: &'static str, id: Uuid },

    /// A write would give two rows the same value for a unique constraint.
    #[error("unique constraint '{constraint}' on table '{table}' violated by field '{field}'")]
    UniqueViolation {
        table: &'static str,
        constraint: &'static str,
        field: &'static str,
    },

    /// A write referenced a row that does not exist in the target table.
    #[error("column '{field}' on table '{table}' references missing row {id}")]
    ForeignKeyViolation {
        table: &'static str,
        field: &'static str,
        id: Uuid,
    },

    /// An insert reused the id of an existing row.
    #[error("duplicate primary key {id} in table '{table}'")]
    DuplicateKey { table: &'static str, id: Uuid },
}
