//! Helpers for reading loosely typed JSON request bodies field by field.
//!
//! Each reader records a [`FieldError`] instead of failing, so a handler can
//! report every malformed field of a body at once.

use serde_json::{Map, Value};
use shop_kernel::{FieldError, FieldErrors};
use uuid::Uuid;

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";

/// State of one field in a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Supplied<T> {
    /// The key was not sent.
    Absent,
    /// The key was sent with a usable value.
    Given(T),
    /// The key was sent but its value was rejected; an error was recorded.
    Invalid,
}

impl<T> Supplied<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Supplied::Absent)
    }

    /// The given value, if any.
    pub fn given(self) -> Option<T> {
        match self {
            Supplied::Given(value) => Some(value),
            _ => None,
        }
    }
}

/// The body as a JSON object, or a `non_field_errors` entry naming what was sent instead.
pub fn expect_object(body: &Value) -> Result<&Map<String, Value>, FieldErrors> {
    body.as_object().ok_or_else(|| {
        std::iter::once(FieldError::non_field(format!(
            "Invalid data. Expected a dictionary, but got {}.",
            json_kind(body)
        )))
        .collect()
    })
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// A non-null string field, with surrounding whitespace trimmed.
pub fn read_string(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Supplied<String> {
    match object.get(field) {
        None => Supplied::Absent,
        Some(Value::String(text)) => Supplied::Given(text.trim().to_string()),
        Some(Value::Null) => reject(errors, field, NOT_NULL),
        Some(_) => reject(errors, field, "Not a valid string."),
    }
}

/// A nullable integer field. Integral strings such as `"1200"` are accepted.
pub fn read_nullable_int(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Supplied<Option<i32>> {
    let raw = match object.get(field) {
        None => return Supplied::Absent,
        Some(Value::Null) => return Supplied::Given(None),
        Some(Value::Number(number)) => number.as_i64(),
        Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
        Some(_) => None,
    };

    let Some(raw) = raw else {
        return reject(errors, field, "A valid integer is required.");
    };

    if raw > i64::from(i32::MAX) {
        reject(
            errors,
            field,
            format!("Ensure this value is less than or equal to {}.", i32::MAX),
        )
    } else if raw < i64::from(i32::MIN) {
        reject(
            errors,
            field,
            format!("Ensure this value is greater than or equal to {}.", i32::MIN),
        )
    } else {
        // Range checked above.
        Supplied::Given(Some(raw as i32))
    }
}

/// A nullable reference to another entity by id.
pub fn read_nullable_uuid(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Supplied<Option<Uuid>> {
    match object.get(field) {
        None => Supplied::Absent,
        Some(Value::Null) => Supplied::Given(None),
        Some(Value::String(text)) => match Uuid::parse_str(text.trim()) {
            Ok(id) => Supplied::Given(Some(id)),
            Err(_) => reject(errors, field, format!("\"{text}\" is not a valid UUID.")),
        },
        Some(other) => reject(
            errors,
            field,
            format!("Incorrect type. Expected pk value, received {}.", json_kind(other)),
        ),
    }
}

/// Record "required" when the body left `field` out.
pub fn require<T>(field: &str, value: &Supplied<T>, errors: &mut Vec<FieldError>) {
    if value.is_absent() {
        errors.push(FieldError::new(field, REQUIRED));
    }
}

/// Entity ids in paths; anything that is not a UUID cannot name an entity.
pub fn parse_path_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

fn reject<T>(errors: &mut Vec<FieldError>, field: &str, message: impl Into<String>) -> Supplied<T> {
    errors.push(FieldError::new(field, message));
    Supplied::Invalid
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn strings_are_trimmed_and_nulls_rejected() {
        let body = object(json!({"title": "  Rust  ", "subtitle": null, "tag": 3}));
        let mut errors = Vec::new();

        assert_eq!(
            read_string(&body, "title", &mut errors),
            Supplied::Given("Rust".to_string())
        );
        assert_eq!(read_string(&body, "subtitle", &mut errors), Supplied::Invalid);
        assert_eq!(read_string(&body, "tag", &mut errors), Supplied::Invalid);
        assert_eq!(read_string(&body, "missing", &mut errors), Supplied::Absent);
        assert_eq!(
            errors,
            vec![
                FieldError::new("subtitle", NOT_NULL),
                FieldError::new("tag", "Not a valid string."),
            ]
        );
    }

    #[test]
    fn integers_accept_numeric_strings_within_range() {
        let body = object(json!({
            "a": 1200,
            "b": "3000",
            "c": null,
            "d": 1.5,
            "e": 3_000_000_000_i64
        }));
        let mut errors = Vec::new();

        assert_eq!(read_nullable_int(&body, "a", &mut errors), Supplied::Given(Some(1200)));
        assert_eq!(read_nullable_int(&body, "b", &mut errors), Supplied::Given(Some(3000)));
        assert_eq!(read_nullable_int(&body, "c", &mut errors), Supplied::Given(None));
        assert_eq!(read_nullable_int(&body, "d", &mut errors), Supplied::Invalid);
        assert_eq!(read_nullable_int(&body, "e", &mut errors), Supplied::Invalid);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[1].message,
            "Ensure this value is less than or equal to 2147483647."
        );
    }

    #[test]
    fn uuids_report_bad_values() {
        let id = Uuid::new_v4();
        let body = object(json!({"ok": id.to_string(), "bad": "nope", "num": 4}));
        let mut errors = Vec::new();

        assert_eq!(read_nullable_uuid(&body, "ok", &mut errors), Supplied::Given(Some(id)));
        assert_eq!(read_nullable_uuid(&body, "bad", &mut errors), Supplied::Invalid);
        assert_eq!(read_nullable_uuid(&body, "num", &mut errors), Supplied::Invalid);
        assert_eq!(errors[0].message, "\"nope\" is not a valid UUID.");
        assert_eq!(
            errors[1].message,
            "Incorrect type. Expected pk value, received number."
        );
    }

    #[test]
    fn non_objects_are_rejected_with_their_kind() {
        let errors = expect_object(&json!([1, 2])).unwrap_err();
        assert_eq!(
            errors.get(shop_kernel::NON_FIELD_ERRORS),
            ["Invalid data. Expected a dictionary, but got list."]
        );
    }
}
