use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::candidates::Candidate;
use super::decode_all;
use super::error::AccessResult;
use super::input::require_id;
use crate::aggregate::{self, CandidateStats};
use crate::store::{Collection, DocumentStore, Patch, Query};

const COLLECTION: Collection = Collection::Analytics;

/// View counter stored under the page name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageViews {
    pub id: String,
    pub page: String,
    pub views: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

pub struct AnalyticsService<S> {
    store: Arc<S>,
}

impl<S> Clone for AnalyticsService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> AnalyticsService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Count one view of `page`. The increment is applied by the store, so concurrent
    /// views never overwrite each other.
    pub async fn record_page_view(&self, page: &str) -> AccessResult<()> {
        require_id(page, "page")?;

        let patch = Patch::new()
            .set("page", page)
            .increment("views", 1)
            .server_timestamp("lastUpdated");
        self.store.upsert(COLLECTION, page, patch).await?;
        debug!(page, "page view recorded");
        Ok(())
    }

    pub async fn get_page(&self, page: &str) -> AccessResult<Option<PageViews>> {
        if page.trim().is_empty() {
            return Ok(None);
        }
        match self.store.get(COLLECTION, page).await? {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(&self) -> AccessResult<Vec<PageViews>> {
        let documents = self.store.query(COLLECTION, &Query::all()).await?;
        Ok(decode_all(COLLECTION, documents))
    }

    /// One scan over every candidate: totals, verified count and a party tally.
    pub async fn candidate_stats(&self) -> AccessResult<CandidateStats> {
        let documents = self
            .store
            .query(Collection::Candidates, &Query::all())
            .await?;
        let candidates: Vec<Candidate> = decode_all(Collection::Candidates, documents);
        Ok(aggregate::candidate_stats(&candidates))
    }
}
