use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use shop_http::error::AppError;
use shop_kernel::{FieldError, FieldErrors};
use time::{macros::format_description, Date, UtcOffset};

use super::calculator::{self, BloodType, Fortune};
use crate::utils::{self, Supplied};

/// Response body of a fortune request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FortuneReading {
    pub birth_date: String,
    pub blood_type: BloodType,
    pub current_date: String,
    pub fortune: Fortune,
    pub label: &'static str,
}

impl FortuneReading {
    pub fn new(birth_date: Date, blood_type: BloodType, current_date: Date) -> Self {
        let fortune = calculator::fortune(birth_date, blood_type, current_date);
        Self {
            birth_date: birth_date.to_string(),
            blood_type,
            current_date: current_date.to_string(),
            fortune,
            label: fortune.label(),
        }
    }
}

pub fn router(offset: UtcOffset) -> Router {
    Router::new()
        .route("/", post(draw_fortune))
        .route("/health", get(health_check))
        .with_state(offset)
}

async fn health_check() -> &'static str {
    "fortune module is healthy"
}

async fn draw_fortune(
    State(offset): State<UtcOffset>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<FortuneReading>, AppError> {
    let Json(body) = body?;
    let (birth_date, blood_type) = parse_request(&body)?;
    let reading = FortuneReading::new(birth_date, blood_type, calculator::today(offset));
    Ok(Json(reading))
}

/// Birth date and blood type from a request body, every problem reported.
///
/// `blood_date` is read as an alias of `blood_type` for older clients.
pub fn parse_request(body: &Value) -> Result<(Date, BloodType), FieldErrors> {
    let object = utils::expect_object(body)?;
    let mut errors = Vec::new();

    let birth_date = match utils::read_string(object, "birth_date", &mut errors) {
        Supplied::Given(text) => match parse_date(&text) {
            Ok(date) => Some(date),
            Err(message) => {
                errors.push(FieldError::new("birth_date", message));
                None
            }
        },
        Supplied::Absent => {
            errors.push(FieldError::new("birth_date", utils::REQUIRED));
            None
        }
        Supplied::Invalid => None,
    };

    let blood_type = read_blood_type(object, &mut errors);

    let errors: FieldErrors = errors.into_iter().collect();
    match (birth_date, blood_type) {
        (Some(birth_date), Some(blood_type)) if errors.is_empty() => Ok((birth_date, blood_type)),
        _ => Err(errors),
    }
}

pub fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|_| "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.".to_string())
}

fn read_blood_type(object: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<BloodType> {
    let key = if object.contains_key("blood_type") {
        "blood_type"
    } else {
        "blood_date"
    };

    // Problems with the alias are still reported under `blood_type`.
    let mut read_errors = Vec::new();
    let value = utils::read_string(object, key, &mut read_errors);
    errors.extend(
        read_errors
            .into_iter()
            .map(|error| FieldError::new("blood_type", error.message)),
    );

    match value {
        Supplied::Given(text) => match text.parse() {
            Ok(blood_type) => Some(blood_type),
            Err(message) => {
                errors.push(FieldError::new("blood_type", message));
                None
            }
        },
        Supplied::Absent => {
            errors.push(FieldError::new("blood_type", utils::REQUIRED));
            None
        }
        Supplied::Invalid => None,
    }
}
