//! Document store boundary.
//!
//! The portal never talks to a concrete backend directly. Entity services hold an
//! `Arc<S: DocumentStore>` and express every read as a [`Query`] and every write as a
//! [`Patch`], which keeps the sanitization and aggregation rules independent of the
//! managed database that eventually sits behind the trait.

mod memory;
mod query;
mod timeout;
mod write;

pub use memory::InMemoryDocumentStore;
pub use query::{compare_values, Direction, FieldFilter, OrderBy, Query};
pub use timeout::TimeoutStore;
pub use write::{FieldWrite, Patch};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Collections persisted by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Candidates,
    Promises,
    Feedback,
    Reports,
    Users,
    Analytics,
}

impl Collection {
    pub const fn name(self) -> &'static str {
        match self {
            Collection::Candidates => "candidates",
            Collection::Promises => "promises",
            Collection::Feedback => "feedback",
            Collection::Reports => "reports",
            Collection::Users => "users",
            Collection::Analytics => "analytics",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored document: its id plus the raw field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Decode into a typed record, exposing the document id as `id`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        self.decode_keyed("id")
    }

    /// Decode into a typed record, exposing the document id under `key`.
    pub fn decode_keyed<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        let mut fields = self.fields.clone();
        fields.insert(key.to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|source| StoreError::Decode {
            id: self.id.clone(),
            source,
        })
    }
}

/// Failures surfaced by a store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection} document '{id}' not found")]
    NotFound { collection: Collection, id: String },
    #[error("object '{0}' not found")]
    MissingObject(String),
    #[error("store call exceeded {0:?}")]
    Timeout(Duration),
    #[error("document '{id}' could not be decoded: {source}")]
    Decode {
        id: String,
        source: serde_json::Error,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Document CRUD and query primitives the portal relies on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Equality filters plus an optional ordering. Documents missing the ordering
    /// field are excluded from ordered results.
    async fn query(&self, collection: Collection, query: &Query)
        -> Result<Vec<Document>, StoreError>;

    /// Create a document with a store-assigned id.
    async fn add(&self, collection: Collection, patch: Patch) -> Result<String, StoreError>;

    /// Create or replace the document stored under `id`.
    async fn set(&self, collection: Collection, id: &str, patch: Patch) -> Result<(), StoreError>;

    /// Merge into an existing document; fails with `NotFound` when absent.
    async fn update(&self, collection: Collection, id: &str, patch: Patch)
        -> Result<(), StoreError>;

    /// Merge into a document, creating it when absent.
    async fn upsert(&self, collection: Collection, id: &str, patch: Patch)
        -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}
