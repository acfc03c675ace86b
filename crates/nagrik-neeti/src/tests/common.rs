use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{json, Map, Value};

use crate::entities::Role;
use crate::portal::Portal;
use crate::storage::InMemoryObjectStore;
use crate::store::{
    Collection, Document, DocumentStore, InMemoryDocumentStore, Patch, Query, StoreError,
};

pub(super) type MemoryPortal = Portal<InMemoryDocumentStore, InMemoryObjectStore>;

pub(super) const ADMIN_UID: &str = "admin-1";
pub(super) const CITIZEN_UID: &str = "citizen-1";

pub(super) fn input(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

pub(super) fn memory_portal() -> (Arc<InMemoryDocumentStore>, Arc<MemoryPortal>) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let objects = Arc::new(InMemoryObjectStore::new("nagrik-neeti-test.appspot.com"));
    let portal = Arc::new(Portal::new(Arc::clone(&store), objects));
    (store, portal)
}

/// Portal with one admin and one citizen profile registered.
pub(super) async fn staffed_portal() -> (Arc<InMemoryDocumentStore>, Arc<MemoryPortal>) {
    let (store, portal) = memory_portal();
    portal
        .users
        .create(
            ADMIN_UID,
            &input(json!({ "name": "Meera Admin", "email": "meera@example.org", "role": Role::Admin.as_str() })),
        )
        .await
        .expect("admin registered");
    portal
        .users
        .create(
            CITIZEN_UID,
            &input(json!({ "name": "Kabir", "email": "kabir@example.org" })),
        )
        .await
        .expect("citizen registered");
    (store, portal)
}

pub(super) fn candidate_input(name: &str, party: &str, constituency: &str) -> Map<String, Value> {
    input(json!({
        "name": name,
        "party": party,
        "constituency": constituency,
        "education": "M.A. Public Policy",
        "transparencyScore": 80,
        "promisesTotal": 4,
        "promisesCompleted": 2,
        "fundsAllocated": 10_000_000,
        "fundsUtilized": 8_500_000,
        "assets": { "total": 2_500_000 },
    }))
}

pub(super) fn feedback_input(candidate_id: &str, rating: Value, is_positive: Value) -> Map<String, Value> {
    input(json!({
        "candidateId": candidate_id,
        "userId": CITIZEN_UID,
        "userName": "Kabir",
        "feedbackText": "Visible progress on the ward roads.",
        "rating": rating,
        "isPositive": is_positive,
    }))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Every call fails as if the backend were unreachable.
pub(super) struct FailingStore;

fn unreachable_backend() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, _collection: Collection, _id: &str) -> Result<Option<Document>, StoreError> {
        Err(unreachable_backend())
    }

    async fn query(&self, _collection: Collection, _query: &Query) -> Result<Vec<Document>, StoreError> {
        Err(unreachable_backend())
    }

    async fn add(&self, _collection: Collection, _patch: Patch) -> Result<String, StoreError> {
        Err(unreachable_backend())
    }

    async fn set(&self, _collection: Collection, _id: &str, _patch: Patch) -> Result<(), StoreError> {
        Err(unreachable_backend())
    }

    async fn update(&self, _collection: Collection, _id: &str, _patch: Patch) -> Result<(), StoreError> {
        Err(unreachable_backend())
    }

    async fn upsert(&self, _collection: Collection, _id: &str, _patch: Patch) -> Result<(), StoreError> {
        Err(unreachable_backend())
    }

    async fn delete(&self, _collection: Collection, _id: &str) -> Result<(), StoreError> {
        Err(unreachable_backend())
    }
}

/// Delegates to an in-memory store after sleeping, to exercise call timeouts.
pub(super) struct SlowStore {
    pub(super) inner: InMemoryDocumentStore,
    pub(super) delay: Duration,
}

impl SlowStore {
    pub(super) fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl DocumentStore for SlowStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.query(collection, query).await
    }

    async fn add(&self, collection: Collection, patch: Patch) -> Result<String, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.add(collection, patch).await
    }

    async fn set(&self, collection: Collection, id: &str, patch: Patch) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.set(collection, id, patch).await
    }

    async fn update(&self, collection: Collection, id: &str, patch: Patch) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.update(collection, id, patch).await
    }

    async fn upsert(&self, collection: Collection, id: &str, patch: Patch) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.upsert(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(collection, id).await
    }
}
