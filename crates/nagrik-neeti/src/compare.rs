use serde::Serialize;

use crate::entities::Candidate;
use crate::format::{format_currency, NOT_AVAILABLE};

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Io(std::io::Error),
    Encoding(std::string::FromUtf8Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Csv(err) => write!(f, "failed to write comparison CSV: {}", err),
            ExportError::Io(err) => write!(f, "failed to flush comparison CSV: {}", err),
            ExportError::Encoding(err) => write!(f, "comparison CSV is not UTF-8: {}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Csv(err) => Some(err),
            ExportError::Io(err) => Some(err),
            ExportError::Encoding(err) => Some(err),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<std::string::FromUtf8Error> for ExportError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::Encoding(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub attribute: &'static str,
    pub left: String,
    pub right: String,
}

/// Side-by-side view of two candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub left_id: String,
    pub left_name: String,
    pub right_id: String,
    pub right_name: String,
    pub rows: Vec<ComparisonRow>,
}

fn count(value: Option<f64>) -> String {
    format!("{}", value.filter(|value| value.is_finite()).unwrap_or(0.0))
}

fn text_or(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => fallback.to_string(),
    }
}

fn attribute_values(candidate: &Candidate) -> [(&'static str, String); 10] {
    let transparency = match candidate.transparency_score {
        Some(score) if score > 0.0 => format!("{score}%"),
        _ => NOT_AVAILABLE.to_string(),
    };
    [
        ("Party", candidate.party_or_independent().to_string()),
        (
            "Constituency",
            text_or(candidate.constituency.as_deref(), NOT_AVAILABLE),
        ),
        (
            "Education",
            text_or(candidate.education.as_deref(), "Not disclosed"),
        ),
        ("Assets", format_currency(candidate.assets.total())),
        ("Liabilities", format_currency(candidate.liabilities.total())),
        ("Criminal Cases", candidate.criminal_cases.len().to_string()),
        ("Transparency Score", transparency),
        ("Promises Made", count(candidate.promises_total)),
        ("Promises Fulfilled", count(candidate.promises_completed)),
        (
            "Fulfillment",
            format!("{}%", candidate.fulfillment_percentage()),
        ),
    ]
}

pub fn compare(left: &Candidate, right: &Candidate) -> Comparison {
    let rows = attribute_values(left)
        .into_iter()
        .zip(attribute_values(right))
        .map(|((attribute, left), (_, right))| ComparisonRow {
            attribute,
            left,
            right,
        })
        .collect();

    Comparison {
        left_id: left.id.clone(),
        left_name: left.display_name().to_string(),
        right_id: right.id.clone(),
        right_name: right.display_name().to_string(),
        rows,
    }
}

impl Comparison {
    pub fn file_name(&self) -> String {
        format!("comparison_{}_vs_{}.csv", self.left_name, self.right_name)
    }

    /// Header row plus one row per attribute, with every cell quoted.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(["Attribute", self.left_name.as_str(), self.right_name.as_str()])?;
        for row in &self.rows {
            writer.write_record([row.attribute, row.left.as_str(), row.right.as_str()])?;
        }

        let bytes = writer.into_inner().map_err(|err| err.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}
