use std::collections::btree_map;
use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// A single field mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    Value(Value),
    /// Resolved by the store to the instant the write is applied.
    ServerTimestamp,
    /// Added to the current numeric value (missing counts as zero) inside the store.
    Increment(i64),
}

/// Ordered set of field writes applied as one document mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: BTreeMap<String, FieldWrite>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        let fields = map
            .into_iter()
            .map(|(field, value)| (field, FieldWrite::Value(value)))
            .collect();
        Self { fields }
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, FieldWrite::Value(value.into()));
        self
    }

    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.insert(field, FieldWrite::ServerTimestamp);
        self
    }

    pub fn increment(mut self, field: impl Into<String>, by: i64) -> Self {
        self.insert(field, FieldWrite::Increment(by));
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, write: FieldWrite) {
        self.fields.insert(field.into(), write);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// The literal value written to `field`, if it is a plain value write.
    pub fn value(&self, field: &str) -> Option<&Value> {
        match self.fields.get(field) {
            Some(FieldWrite::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldWrite> {
        self.fields.iter()
    }
}

impl IntoIterator for Patch {
    type Item = (String, FieldWrite);
    type IntoIter = btree_map::IntoIter<String, FieldWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
