use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde_json::{Map, Value};

use super::{Collection, Document, DocumentStore, FieldWrite, Patch, Query, StoreError};

/// Process-local document store used by the service binary, demos, and tests.
///
/// Server timestamps are strictly increasing at microsecond resolution, so ordering by
/// `createdAt` is deterministic even for writes landing within the same microsecond.
/// Increments are applied while the collection lock is held, which makes counters
/// atomic with respect to concurrent writers.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<Collection, BTreeMap<String, Map<String, Value>>>,
    sequence: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl MemoryState {
    fn next_timestamp(&mut self) -> Value {
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    fn next_id(&mut self, collection: Collection) -> String {
        self.sequence += 1;
        format!("{}-{:06}", collection.name(), self.sequence)
    }

    fn apply(&mut self, collection: Collection, id: &str, patch: Patch, create: bool) -> bool {
        let mut timestamp = None;
        let mut resolved = Vec::with_capacity(patch.len());
        for (field, write) in patch {
            match write {
                FieldWrite::ServerTimestamp => {
                    let value = timestamp.get_or_insert_with(|| self.next_timestamp());
                    resolved.push((field, FieldWrite::Value(value.clone())));
                }
                other => resolved.push((field, other)),
            }
        }

        let documents = self.collections.entry(collection).or_default();
        if !create && !documents.contains_key(id) {
            return false;
        }
        let target = documents.entry(id.to_string()).or_default();

        for (field, write) in resolved {
            match write {
                FieldWrite::Value(value) => {
                    target.insert(field, value);
                }
                FieldWrite::Increment(by) => {
                    let current = target.get(&field).and_then(Value::as_i64).unwrap_or(0);
                    target.insert(field, Value::from(current + by));
                }
                FieldWrite::ServerTimestamp => {}
            }
        }
        true
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: Collection) -> usize {
        self.lock()
            .map(|state| {
                state
                    .collections
                    .get(&collection)
                    .map_or(0, BTreeMap::len)
            })
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .collections
            .get(&collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let state = self.lock()?;
        let mut documents: Vec<Document> = state
            .collections
            .get(&collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|(_, fields)| query.matches(fields))
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        drop(state);

        query.sort(&mut documents);
        Ok(documents)
    }

    async fn add(&self, collection: Collection, patch: Patch) -> Result<String, StoreError> {
        let mut state = self.lock()?;
        let id = state.next_id(collection);
        state.apply(collection, &id, patch, true);
        Ok(id)
    }

    async fn set(&self, collection: Collection, id: &str, patch: Patch) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state
            .collections
            .entry(collection)
            .or_default()
            .insert(id.to_string(), Map::new());
        state.apply(collection, id, patch, true);
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Patch,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.apply(collection, id, patch, false) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
        }
    }

    async fn upsert(
        &self,
        collection: Collection,
        id: &str,
        patch: Patch,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.apply(collection, id, patch, true);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if let Some(documents) = state.collections.get_mut(&collection) {
            documents.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn add_assigns_ids_and_resolves_timestamps() {
        let store = InMemoryDocumentStore::new();
        let id = store
            .add(
                Collection::Candidates,
                Patch::new()
                    .set("name", "Asha")
                    .server_timestamp("createdAt")
                    .server_timestamp("lastUpdated"),
            )
            .await
            .expect("add succeeds");

        let document = store
            .get(Collection::Candidates, &id)
            .await
            .expect("get succeeds")
            .expect("document stored");

        assert_eq!(document.get("name"), Some(&json!("Asha")));
        let created = document.get("createdAt").expect("timestamp resolved");
        assert!(created.is_string());
        assert_eq!(Some(created), document.get("lastUpdated"));
    }

    #[tokio::test]
    async fn timestamps_strictly_increase() {
        let store = InMemoryDocumentStore::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let id = store
                .add(
                    Collection::Feedback,
                    Patch::new().server_timestamp("createdAt"),
                )
                .await
                .expect("add succeeds");
            ids.push(id);
        }

        let ordered = store
            .query(Collection::Feedback, &Query::all().order_by_desc("createdAt"))
            .await
            .expect("query succeeds");
        let ordered_ids: Vec<String> = ordered.into_iter().map(|doc| doc.id).collect();
        ids.reverse();
        assert_eq!(ordered_ids, ids);
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let result = store
            .update(Collection::Promises, "missing", Patch::new().set("title", "x"))
            .await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = InMemoryDocumentStore::new();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert(
                        Collection::Analytics,
                        "home",
                        Patch::new().increment("views", 1),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.expect("task joins").expect("upsert succeeds");
        }

        let document = store
            .get(Collection::Analytics, "home")
            .await
            .expect("get succeeds")
            .expect("counter exists");
        assert_eq!(document.get("views"), Some(&json!(32)));
    }

    #[tokio::test]
    async fn set_replaces_previous_fields() {
        let store = InMemoryDocumentStore::new();
        store
            .set(Collection::Users, "u1", Patch::new().set("name", "A").set("email", "a@b.in"))
            .await
            .expect("first set");
        store
            .set(Collection::Users, "u1", Patch::new().set("name", "B"))
            .await
            .expect("second set");

        let document = store
            .get(Collection::Users, "u1")
            .await
            .expect("get succeeds")
            .expect("user exists");
        assert_eq!(document.get("name"), Some(&json!("B")));
        assert!(document.get("email").is_none());
    }
}
