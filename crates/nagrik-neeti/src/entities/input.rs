use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use super::error::ValidationError;

pub(crate) type Input = Map<String, Value>;

pub(crate) fn require_id(id: &str, field: &'static str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Non-empty string field, required at creation.
pub(crate) fn required_text(input: &Input, field: &'static str) -> Result<String, ValidationError> {
    match input.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.clone()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// String field or the empty string.
pub(crate) fn text_or_empty(input: &Input, field: &str) -> String {
    match input.get(field) {
        Some(Value::String(text)) => text.clone(),
        _ => String::new(),
    }
}

/// Present fields must be strings; absent fields yield `None`.
pub(crate) fn provided_text(
    input: &Input,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match input.get(field) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(ValidationError::InvalidType {
            field,
            expected: "a string",
        }),
    }
}

pub(crate) fn provided_flag(
    input: &Input,
    field: &'static str,
) -> Result<Option<bool>, ValidationError> {
    match input.get(field) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(ValidationError::InvalidType {
            field,
            expected: "a boolean",
        }),
    }
}

pub(crate) fn provided_links(
    input: &Input,
    field: &'static str,
) -> Result<Option<Vec<String>>, ValidationError> {
    match input.get(field) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(string_items(items))),
        Some(_) => Err(ValidationError::InvalidType {
            field,
            expected: "an array of strings",
        }),
    }
}

pub(crate) fn links_or_empty(input: &Input, field: &str) -> Vec<String> {
    match input.get(field) {
        Some(Value::Array(items)) => string_items(items),
        _ => Vec::new(),
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

pub(crate) fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|number| number.is_finite())
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 instant and keeps the calendar date.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|instant| instant.date_naive())
        })
}

/// Nullable date field: `Ok(None)` when absent, `Ok(Some(None))` for explicit null.
pub(crate) fn provided_date(
    input: &Input,
    field: &'static str,
) -> Result<Option<Option<NaiveDate>>, ValidationError> {
    let invalid = ValidationError::InvalidType {
        field,
        expected: "a YYYY-MM-DD date",
    };
    match input.get(field) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(Some(None)),
        Some(Value::String(raw)) => parse_date(raw).map(|date| Some(Some(date))).ok_or(invalid),
        Some(_) => Err(invalid),
    }
}

pub(crate) fn date_value(date: Option<NaiveDate>) -> Value {
    match date {
        Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
        None => Value::Null,
    }
}

/// Stringify a rejected variant for error messages.
pub(crate) fn variant_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Trimmed text bounded to `max` characters.
pub(crate) fn bounded_text(
    value: Option<&Value>,
    field: &'static str,
    max: usize,
) -> Result<String, ValidationError> {
    let text = value.and_then(Value::as_str).map(str::trim).unwrap_or("");
    if text.is_empty() {
        return Err(ValidationError::EmptyText { field });
    }
    if text.chars().count() > max {
        return Err(ValidationError::TextTooLong { field, max });
    }
    Ok(text.to_string())
}
