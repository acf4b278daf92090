use serde_json::Value;
use shop_kernel::{FieldError, FieldErrors};
use uuid::Uuid;

use super::models::{Book, BookDraft};
use crate::utils::{self, Supplied};

/// How a payload is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// New book: `title` is required.
    Create,
    /// Full update: every mutable field must be sent.
    Replace,
    /// Partial update: only sent fields change.
    Partial,
}

/// Client-supplied book fields. `id` and `created_at` are server-owned and
/// never read from a request; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPayload {
    pub title: Supplied<String>,
    pub price: Supplied<Option<i32>>,
    pub publisher_id: Supplied<Option<Uuid>>,
    type_errors: Vec<FieldError>,
}

impl Default for BookPayload {
    fn default() -> Self {
        Self {
            title: Supplied::Absent,
            price: Supplied::Absent,
            publisher_id: Supplied::Absent,
            type_errors: Vec::new(),
        }
    }
}

impl BookPayload {
    /// Read a request body. Only a body that is not a JSON object fails
    /// here; per-field type problems are kept for [`Self::shape_errors`].
    pub fn from_json(body: &Value) -> Result<Self, FieldErrors> {
        let object = utils::expect_object(body)?;
        let mut type_errors = Vec::new();

        Ok(Self {
            title: utils::read_string(object, "title", &mut type_errors),
            price: utils::read_nullable_int(object, "price", &mut type_errors),
            publisher_id: utils::read_nullable_uuid(object, "publisher_id", &mut type_errors),
            type_errors,
        })
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Supplied::Given(title.into());
        self
    }

    pub fn price(mut self, price: Option<i32>) -> Self {
        self.price = Supplied::Given(price);
        self
    }

    pub fn publisher_id(mut self, publisher_id: Option<Uuid>) -> Self {
        self.publisher_id = Supplied::Given(publisher_id);
        self
    }

    /// Malformed values plus the fields `mode` requires but the payload lacks.
    pub fn shape_errors(&self, mode: WriteMode) -> Vec<FieldError> {
        let mut errors = self.type_errors.clone();
        match mode {
            WriteMode::Create => utils::require("title", &self.title, &mut errors),
            WriteMode::Replace => {
                utils::require("title", &self.title, &mut errors);
                utils::require("price", &self.price, &mut errors);
                utils::require("publisher_id", &self.publisher_id, &mut errors);
            }
            WriteMode::Partial => {}
        }
        errors
    }

    /// Overlay the sent fields on `current`. Fields that were not sent keep
    /// their current value; rejected fields become unknown.
    pub fn merge(&self, current: Option<&Book>) -> BookDraft {
        BookDraft {
            title: match &self.title {
                Supplied::Given(title) => Some(title.clone()),
                Supplied::Absent => current.map(|book| book.title.clone()),
                Supplied::Invalid => None,
            },
            price: match &self.price {
                Supplied::Given(price) => *price,
                Supplied::Absent => current.and_then(|book| book.price),
                Supplied::Invalid => None,
            },
            publisher_id: match &self.publisher_id {
                Supplied::Given(publisher_id) => *publisher_id,
                Supplied::Absent => current.and_then(|book| book.publisher_id),
                Supplied::Invalid => None,
            },
        }
    }
}
