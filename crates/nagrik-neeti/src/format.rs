//! Display formatting for amounts, counts, dates and enum labels.
//!
//! Amounts follow the Indian numbering convention: digits are grouped as
//! `12,34,56,789`, and large amounts collapse to Lakh (1,00,000) or Crore
//! (1,00,00,000) units.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::entities::{PromiseStatus, ReportKind, Role};

pub const NOT_AVAILABLE: &str = "N/A";

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;

/// Round half up to `decimals` places and render with exactly that many places.
pub fn fixed_decimal(value: f64, decimals: usize) -> String {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    format!("{rounded:.decimals$}")
}

/// Group the digits of an unsigned integer string the Indian way.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// Indian-grouped number with up to three fraction digits; non-finite input is `"0"`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rendered = fixed_decimal(value.abs(), 3);
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');
    let sign = if value < 0.0 && (whole != "0" || !fraction.is_empty()) {
        "-"
    } else {
        ""
    };
    let grouped = group_indian(whole);
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

/// Whole-rupee amount: `"1.3 Cr"`, `"2.5 Lakh"`, or grouped digits below one Lakh.
/// Fractions are truncated before formatting and non-finite input counts as zero.
pub fn format_currency(amount: f64) -> String {
    let whole = if amount.is_finite() { amount.trunc() } else { 0.0 };
    if whole >= CRORE {
        format!("{} Cr", fixed_decimal(whole / CRORE, 1))
    } else if whole >= LAKH {
        format!("{} Lakh", fixed_decimal(whole / LAKH, 1))
    } else {
        format_number(whole)
    }
}

/// [`format_currency`] with the rupee sign.
pub fn format_rupees(amount: f64) -> String {
    format!("₹{}", format_currency(amount))
}

pub fn format_percentage(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    format!("{}%", fixed_decimal(value, decimals))
}

/// Anything that can stand for an instant: typed timestamps, date strings, epoch
/// millis, or a stored timestamp object carrying `seconds`/`nanoseconds`.
pub trait ToDateTime {
    fn to_date_time(&self) -> Option<DateTime<Utc>>;
}

impl ToDateTime for DateTime<Utc> {
    fn to_date_time(&self) -> Option<DateTime<Utc>> {
        Some(*self)
    }
}

impl ToDateTime for NaiveDate {
    fn to_date_time(&self) -> Option<DateTime<Utc>> {
        self.and_hms_opt(0, 0, 0)
            .map(|midnight| Utc.from_utc_datetime(&midnight))
    }
}

impl ToDateTime for str {
    fn to_date_time(&self) -> Option<DateTime<Utc>> {
        let trimmed = self.trim();
        DateTime::parse_from_rfc3339(trimmed)
            .map(|instant| instant.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.to_date_time())
            })
    }
}

impl ToDateTime for String {
    fn to_date_time(&self) -> Option<DateTime<Utc>> {
        self.as_str().to_date_time()
    }
}

/// Milliseconds since the Unix epoch.
impl ToDateTime for i64 {
    fn to_date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(*self)
    }
}

impl ToDateTime for Value {
    fn to_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::String(raw) => raw.to_date_time(),
            Value::Number(number) => number.as_i64().and_then(|millis| millis.to_date_time()),
            Value::Object(fields) => {
                let seconds = fields.get("seconds").and_then(Value::as_i64)?;
                let nanos = fields
                    .get("nanoseconds")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
            }
            _ => None,
        }
    }
}

impl<T: ToDateTime + ?Sized> ToDateTime for &T {
    fn to_date_time(&self) -> Option<DateTime<Utc>> {
        (**self).to_date_time()
    }
}

impl<T: ToDateTime> ToDateTime for Option<T> {
    fn to_date_time(&self) -> Option<DateTime<Utc>> {
        self.as_ref().and_then(ToDateTime::to_date_time)
    }
}

/// `"5 January 2025"`, or `"N/A"` when the value is missing or unparseable.
pub fn format_date<T: ToDateTime + ?Sized>(value: &T) -> String {
    value
        .to_date_time()
        .map_or_else(|| NOT_AVAILABLE.to_string(), |instant| {
            instant.format("%-d %B %Y").to_string()
        })
}

/// `"5 January 2025, 02:30 pm"` in UTC, or `"N/A"`.
pub fn format_date_time<T: ToDateTime + ?Sized>(value: &T) -> String {
    value
        .to_date_time()
        .map_or_else(|| NOT_AVAILABLE.to_string(), |instant| {
            instant.format("%-d %B %Y, %I:%M %P").to_string()
        })
}

pub fn promise_status_label(status: PromiseStatus) -> &'static str {
    match status {
        PromiseStatus::Planned => "○ Planned",
        PromiseStatus::InProgress => "~ In Progress",
        PromiseStatus::Completed => "✓ Completed",
    }
}

/// Label for a raw stored status; unknown values are shown as stored.
pub fn format_promise_status(raw: &str) -> String {
    raw.parse::<PromiseStatus>()
        .map_or_else(|_| raw.to_string(), |status| promise_status_label(status).to_string())
}

pub fn report_kind_label(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Criminal => "Criminal Record",
        ReportKind::Asset => "Asset Declaration",
        ReportKind::Performance => "Performance Report",
    }
}

pub fn format_report_type(raw: &str) -> String {
    raw.parse::<ReportKind>()
        .map_or_else(|_| raw.to_string(), |kind| report_kind_label(kind).to_string())
}

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Admin => "Administrator",
    }
}

/// First `max_chars` characters followed by `...` when the text is longer.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(score) if score.is_finite() => format!("{}/10", fixed_decimal(score, 1)),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_promise_ratio(completed: u64, total: u64) -> String {
    if total == 0 {
        return "0/0".to_string();
    }
    format!("{completed}/{total}")
}

/// Star strip for a 1..=5 rating, e.g. `"★★★☆☆"`.
pub fn rating_stars(rating: f64) -> String {
    let filled = if rating.is_finite() {
        rating.round().clamp(0.0, 5.0) as usize
    } else {
        0
    };
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub fn status_badge_class(status: &str) -> &'static str {
    match status {
        "completed" | "true" => "badge-success",
        "in-progress" => "badge-warning",
        "planned" => "badge-info",
        "false" => "badge-danger",
        _ => "badge-default",
    }
}
