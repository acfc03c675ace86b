//! Declared field schemas used to sanitize untyped write payloads.
//!
//! A schema lists every field a collection accepts together with its expected shape.
//! Creation payloads always carry the full field set (invalid or missing values become
//! the kind's empty value); update payloads only carry fields that were supplied with a
//! valid shape. Unknown fields are dropped in both cases.

use serde_json::{Map, Value};

use super::input::finite_number;

/// Expected shape of a sanitized field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Any finite number.
    Number,
    /// Finite number within 0..=100.
    Score,
    List,
    Object,
    Flag,
}

impl FieldKind {
    /// The value kept for `value`, or `None` when its shape does not match.
    pub fn accept(self, value: &Value) -> Option<Value> {
        let accepted = match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Number => finite_number(value).is_some(),
            FieldKind::Score => {
                finite_number(value).is_some_and(|score| (0.0..=100.0).contains(&score))
            }
            FieldKind::List => value.is_array(),
            FieldKind::Object => value.is_object(),
            FieldKind::Flag => value.is_boolean(),
        };
        accepted.then(|| value.clone())
    }

    /// Placeholder stored at creation when the field is missing or malformed.
    pub fn empty(self) -> Value {
        match self {
            FieldKind::List => Value::Array(Vec::new()),
            FieldKind::Object => Value::Object(Map::new()),
            FieldKind::Text | FieldKind::Number | FieldKind::Score | FieldKind::Flag => {
                Value::Null
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    fields: &'static [FieldSpec],
}

impl Schema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn sanitize_for_create(&self, input: &Map<String, Value>) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|field| {
                let value = input
                    .get(field.name)
                    .and_then(|value| field.kind.accept(value))
                    .unwrap_or_else(|| field.kind.empty());
                (field.name.to_string(), value)
            })
            .collect()
    }

    pub fn sanitize_for_update(&self, input: &Map<String, Value>) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|field| {
                input
                    .get(field.name)
                    .and_then(|value| field.kind.accept(value))
                    .map(|value| (field.name.to_string(), value))
            })
            .collect()
    }
}
