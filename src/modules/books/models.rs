use serde::{Deserialize, Serialize};
use shop_db::{FieldKind, FieldSpec, Filterable, Record, Scalar, UniqueKey};
use time::OffsetDateTime;
use uuid::Uuid;

/// Name of the unique constraint on book titles.
pub const TITLE_UNIQUE: &str = "book_title_unique";

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 20;

/// A persisted book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Server-generated identifier
    pub id: Uuid,
    /// Title, unique across all books
    pub title: String,
    /// Price in yen, if known
    pub price: Option<i32>,
    /// Publisher, cleared when the publisher is deleted
    pub publisher_id: Option<Uuid>,
    /// Server-assigned creation time
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Record for Book {
    const TABLE: &'static str = "book";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new(TITLE_UNIQUE, "title", self.title.clone())]
    }
}

impl Filterable for Book {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id", FieldKind::Uuid),
        FieldSpec::new("title", FieldKind::Text),
        FieldSpec::new("price", FieldKind::Integer).nullable(),
        FieldSpec::new("publisher_id", FieldKind::Uuid)
            .nullable()
            .aliases(&["publisher"]),
        FieldSpec::new("created_at", FieldKind::Timestamp),
    ];

    fn scalar(&self, field: &str) -> Option<Scalar> {
        match field {
            "id" => Some(Scalar::Uuid(self.id)),
            "title" => Some(Scalar::Text(self.title.clone())),
            "price" => self.price.map(|price| Scalar::Integer(i64::from(price))),
            "publisher_id" => self.publisher_id.map(Scalar::Uuid),
            "created_at" => Some(Scalar::Timestamp(self.created_at)),
            _ => None,
        }
    }
}

/// Candidate field values after merging a request over the current record.
///
/// `None` for `title` means the value is unknown because the request left
/// it out or sent something unusable; rules about the title skip it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDraft {
    pub title: Option<String>,
    pub price: Option<i32>,
    pub publisher_id: Option<Uuid>,
}

impl BookDraft {
    pub fn new(title: impl Into<String>, price: Option<i32>) -> Self {
        Self {
            title: Some(title.into()),
            price,
            publisher_id: None,
        }
    }

    pub fn with_publisher(mut self, publisher_id: Uuid) -> Self {
        self.publisher_id = Some(publisher_id);
        self
    }
}
