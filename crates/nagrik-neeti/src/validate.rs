//! Form-field validators.
//!
//! Every predicate trims its input first and never panics, so page handlers can run
//! them on raw form values before anything reaches an entity service.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
static DIGIT: OnceLock<Option<Regex>> = OnceLock::new();
static ALPHANUMERIC: OnceLock<Option<Regex>> = OnceLock::new();

fn matches(cell: &'static OnceLock<Option<Regex>>, pattern: &str, value: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|regex| regex.is_match(value))
}

pub fn is_required(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn min_length(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

pub fn max_length(value: &str, max: usize) -> bool {
    value.trim().chars().count() <= max
}

/// `local@domain.tld` with no whitespace and exactly one `@` per side.
pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && matches(&EMAIL, r"^[^\s@]+@[^\s@]+\.[^\s@]+$", value)
}

/// At least six characters including one digit.
pub fn is_strong_password(value: &str) -> bool {
    let value = value.trim();
    value.chars().count() >= 6 && matches(&DIGIT, r"\d", value)
}

/// Latin letters, digits and spaces only.
pub fn is_alphanumeric(value: &str) -> bool {
    matches(&ALPHANUMERIC, r"(?i)^[a-z0-9 ]+$", value.trim())
}

pub fn is_one_of<T: PartialEq>(value: &T, allowed: &[T]) -> bool {
    allowed.contains(value)
}

pub fn is_valid_integer(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .is_ok_and(|number| number.is_finite() && number.fract() == 0.0)
}

/// Inclusive range check; NaN is never in range.
pub fn is_in_range(value: f64, min: f64, max: f64) -> bool {
    !value.is_nan() && value >= min && value <= max
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    Required,
    Email,
    StrongPassword,
}

impl Rule {
    fn check(self, value: &str) -> Option<&'static str> {
        let (valid, message) = match self {
            Rule::Required => (is_required(value), "This field is required."),
            Rule::Email => (is_valid_email(value), "Invalid email address."),
            Rule::StrongPassword => (is_strong_password(value), "Password is too weak."),
        };
        (!valid).then_some(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    pub value: String,
    pub rules: Vec<Rule>,
}

impl FieldRules {
    pub fn new(value: impl Into<String>, rules: &[Rule]) -> Self {
        Self {
            value: value.into(),
            rules: rules.to_vec(),
        }
    }
}

/// Run each field's rules in order. A field maps to the message of the *last* rule it
/// failed; fields that pass every rule are absent from the result.
pub fn validate_form(fields: &BTreeMap<String, FieldRules>) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    for (field, config) in fields {
        for rule in &config.rules {
            if let Some(message) = rule.check(&config.value) {
                errors.insert(field.clone(), message.to_string());
            }
        }
    }
    errors
}
