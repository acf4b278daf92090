//! Ordered validation pipeline for books.
//!
//! Each rule is a pure function of the candidate values and the records it
//! is checked against. Rules run in order (field rules, then cross-field
//! rules, then uniqueness) and every error they return is kept.

use shop_kernel::{FieldError, FieldErrors};
use uuid::Uuid;

use super::models::{Book, BookDraft, TITLE_MAX_CHARS};

pub const TITLE_BLANK: &str = "Title is required.";
pub const TITLE_NO_JAVA: &str = "Title must not contain \"Java\".";
pub const THIN_BOOK_TOO_EXPENSIVE: &str = "Thin books (薄い本) must not cost more than 3,000 yen.";
pub const TITLE_TAKEN: &str = "book with this title already exists.";
pub const TITLE_PRICE_TAKEN: &str = "Title and price must be unique together.";

const BANNED_TITLE_WORD: &str = "Java";
const THIN_BOOK_MARKER: &str = "薄い本";
const THIN_BOOK_PRICE_CEILING: i32 = 3000;

/// What a draft is validated against.
#[derive(Debug, Clone, Copy)]
pub struct Existing<'a> {
    /// Every stored book except the one being updated.
    pub others: &'a [Book],
    /// Whether the draft's publisher, if any, exists.
    pub publisher_exists: bool,
}

pub type Rule = fn(&BookDraft, &Existing<'_>) -> Vec<FieldError>;

/// Rules in evaluation order.
pub const PIPELINE: &[Rule] = &[
    title_not_blank,
    title_max_length,
    title_without_java,
    publisher_exists,
    thin_book_price_ceiling,
    title_unique,
    title_and_price_unique_together,
];

/// Run every rule and collect all of their errors.
pub fn validate(draft: &BookDraft, existing: &Existing<'_>) -> FieldErrors {
    PIPELINE
        .iter()
        .flat_map(|rule| rule(draft, existing))
        .collect()
}

fn title_not_blank(draft: &BookDraft, _: &Existing<'_>) -> Vec<FieldError> {
    match draft.title.as_deref() {
        Some(title) if title.trim().is_empty() => vec![FieldError::new("title", TITLE_BLANK)],
        _ => Vec::new(),
    }
}

fn title_max_length(draft: &BookDraft, _: &Existing<'_>) -> Vec<FieldError> {
    match draft.title.as_deref() {
        Some(title) if title.chars().count() > TITLE_MAX_CHARS => vec![FieldError::new(
            "title",
            format!("Ensure this field has no more than {TITLE_MAX_CHARS} characters."),
        )],
        _ => Vec::new(),
    }
}

fn title_without_java(draft: &BookDraft, _: &Existing<'_>) -> Vec<FieldError> {
    match draft.title.as_deref() {
        Some(title) if title.contains(BANNED_TITLE_WORD) => {
            vec![FieldError::new("title", TITLE_NO_JAVA)]
        }
        _ => Vec::new(),
    }
}

fn publisher_exists(draft: &BookDraft, existing: &Existing<'_>) -> Vec<FieldError> {
    match draft.publisher_id {
        Some(id) if !existing.publisher_exists => vec![FieldError::new(
            "publisher_id",
            missing_publisher_message(id),
        )],
        _ => Vec::new(),
    }
}

fn thin_book_price_ceiling(draft: &BookDraft, _: &Existing<'_>) -> Vec<FieldError> {
    match (draft.title.as_deref(), draft.price) {
        (Some(title), Some(price))
            if title.contains(THIN_BOOK_MARKER) && price > THIN_BOOK_PRICE_CEILING =>
        {
            vec![FieldError::non_field(THIN_BOOK_TOO_EXPENSIVE)]
        }
        _ => Vec::new(),
    }
}

fn title_unique(draft: &BookDraft, existing: &Existing<'_>) -> Vec<FieldError> {
    match draft.title.as_deref() {
        Some(title) if existing.others.iter().any(|book| book.title == title) => {
            vec![FieldError::new("title", TITLE_TAKEN)]
        }
        _ => Vec::new(),
    }
}

/// Pairs with a null price never collide, as with a composite unique index
/// over a nullable column.
fn title_and_price_unique_together(draft: &BookDraft, existing: &Existing<'_>) -> Vec<FieldError> {
    let (Some(title), Some(price)) = (draft.title.as_deref(), draft.price) else {
        return Vec::new();
    };

    if existing
        .others
        .iter()
        .any(|book| book.title == title && book.price == Some(price))
    {
        vec![FieldError::non_field(TITLE_PRICE_TAKEN)]
    } else {
        Vec::new()
    }
}

pub fn missing_publisher_message(id: Uuid) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}
