use serde::Serialize;

use crate::store::{Collection, StoreError};

/// Write-boundary rejections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} cannot be empty")]
    EmptyText { field: &'static str },
    #[error("{field} cannot exceed {max} characters")]
    TextTooLong { field: &'static str, max: usize },
    #[error("{field} must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("unknown {field} '{value}'")]
    UnknownVariant { field: &'static str, value: String },
    #[error("{lesser} cannot exceed {greater}")]
    Exceeds {
        lesser: &'static str,
        greater: &'static str,
    },
}

/// Tagged failure returned by every entity operation.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{collection} document '{id}' not found")]
    NotFound { collection: Collection, id: String },
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("backend error: {0}")]
    Backend(#[source] StoreError),
}

impl AccessError {
    pub fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }
}

impl From<StoreError> for AccessError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { collection, id } => Self::NotFound { collection, id },
            other => Self::Backend(other),
        }
    }
}

pub type AccessResult<T> = Result<T, AccessError>;

/// Result of a partial update: `Skipped` means nothing valid was supplied and the store
/// was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Applied,
    Skipped,
}
