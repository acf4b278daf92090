use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_db::Record;
use shop_kernel::{FieldError, FieldErrors};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::utils::{self, Supplied};

/// Maximum publisher name length, in characters.
pub const NAME_MAX_CHARS: usize = 20;

/// A publisher that books may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Publisher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

impl Record for Publisher {
    const TABLE: &'static str = "publisher";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Validate a create request and return the publisher name.
pub fn parse_new_publisher(body: &Value) -> Result<String, FieldErrors> {
    let object = utils::expect_object(body)?;
    let mut errors = Vec::new();

    let name = utils::read_string(object, "name", &mut errors);
    utils::require("name", &name, &mut errors);

    if let Supplied::Given(name) = &name {
        if name.is_empty() {
            errors.push(FieldError::new("name", "This field may not be blank."));
        } else if name.chars().count() > NAME_MAX_CHARS {
            errors.push(FieldError::new(
                "name",
                format!("Ensure this field has no more than {NAME_MAX_CHARS} characters."),
            ));
        }
    }

    let errors: FieldErrors = errors.into_iter().collect();
    match name.given() {
        Some(name) if errors.is_empty() => Ok(name),
        _ => Err(errors),
    }
}
