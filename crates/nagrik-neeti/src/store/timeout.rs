use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{Collection, Document, DocumentStore, Patch, Query, StoreError};

/// Bounds every call to the wrapped store so a request that never resolves surfaces as
/// [`StoreError::Timeout`] instead of leaving the caller waiting.
#[derive(Debug, Clone)]
pub struct TimeoutStore<S> {
    inner: S,
    limit: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    async fn guard<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, limit_ms = self.limit.as_millis() as u64, "store call timed out");
                Err(StoreError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TimeoutStore<S> {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        self.guard("get", self.inner.get(collection, id)).await
    }

    async fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        self.guard("query", self.inner.query(collection, query)).await
    }

    async fn add(&self, collection: Collection, patch: Patch) -> Result<String, StoreError> {
        self.guard("add", self.inner.add(collection, patch)).await
    }

    async fn set(&self, collection: Collection, id: &str, patch: Patch) -> Result<(), StoreError> {
        self.guard("set", self.inner.set(collection, id, patch)).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Patch,
    ) -> Result<(), StoreError> {
        self.guard("update", self.inner.update(collection, id, patch))
            .await
    }

    async fn upsert(
        &self,
        collection: Collection,
        id: &str,
        patch: Patch,
    ) -> Result<(), StoreError> {
        self.guard("upsert", self.inner.upsert(collection, id, patch))
            .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.guard("delete", self.inner.delete(collection, id)).await
    }
}
