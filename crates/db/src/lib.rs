//! Persistence collaborator for the shop service.
//!
//! [`Table`] keeps rows in insertion order and enforces the unique
//! constraints each [`Record`] declares. [`filter::FilterSet`] turns
//! Django-style query parameters into criteria evaluated against rows.

pub mod error;
pub mod filter;
pub mod table;

pub use error::DbError;
pub use filter::{FieldKind, FieldSpec, FilterSet, Filterable, Scalar};
pub use table::{Record, Table, UniqueKey};
