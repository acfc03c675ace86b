use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality constraint on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Collection query: conjunction of equality filters with an optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<FieldFilter>,
    order_by: Option<OrderBy>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn order_by_desc(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Descending)
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    /// Whether a stored field map belongs in the result set.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        let filtered = self
            .filters
            .iter()
            .all(|filter| fields.get(&filter.field) == Some(&filter.value));

        let orderable = match &self.order_by {
            Some(order) => fields.contains_key(&order.field),
            None => true,
        };

        filtered && orderable
    }

    /// Stable sort according to the ordering clause, if any.
    pub fn sort(&self, documents: &mut [Document]) {
        let Some(order) = &self.order_by else {
            return;
        };

        documents.sort_by(|left, right| {
            let ordering = match (left.get(&order.field), right.get(&order.field)) {
                (Some(a), Some(b)) => compare_values(a, b),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: values of different types order by type, numbers
/// numerically, strings lexicographically.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        Document::new(id, value.as_object().cloned().expect("object literal"))
    }

    #[test]
    fn matches_requires_every_filter_and_the_order_field() {
        let query = Query::all()
            .where_eq("candidateId", "c1")
            .order_by_desc("createdAt");

        let complete = json!({ "candidateId": "c1", "createdAt": "2025-01-01T00:00:00Z" });
        let unordered = json!({ "candidateId": "c1" });
        let other = json!({ "candidateId": "c2", "createdAt": "2025-01-01T00:00:00Z" });

        assert!(query.matches(complete.as_object().expect("object")));
        assert!(!query.matches(unordered.as_object().expect("object")));
        assert!(!query.matches(other.as_object().expect("object")));
    }

    #[test]
    fn descending_sort_puts_latest_first() {
        let query = Query::all().order_by_desc("createdAt");
        let mut docs = vec![
            doc("a", json!({ "createdAt": "2025-01-01T00:00:00.000001Z" })),
            doc("b", json!({ "createdAt": "2025-03-01T00:00:00.000001Z" })),
            doc("c", json!({ "createdAt": "2025-02-01T00:00:00.000001Z" })),
        ];

        query.sort(&mut docs);

        let ids: Vec<&str> = docs.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(compare_values(&json!(9), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("9"), &json!("10")), Ordering::Greater);
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
    }
}
