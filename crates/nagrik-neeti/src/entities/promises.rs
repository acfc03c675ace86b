use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::error::{AccessError, AccessResult, ValidationError, WriteOutcome};
use super::input::{
    date_value, finite_number, links_or_empty, provided_date, provided_links, provided_text,
    require_id, required_text, text_or_empty, variant_text, Input,
};
use super::{decode_all, null_as_default};
use crate::store::{Collection, DocumentStore, Patch, Query};

const COLLECTION: Collection = Collection::Promises;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromiseStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

impl PromiseStatus {
    pub const ALL: [PromiseStatus; 3] = [
        PromiseStatus::Planned,
        PromiseStatus::InProgress,
        PromiseStatus::Completed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PromiseStatus::Planned => "planned",
            PromiseStatus::InProgress => "in-progress",
            PromiseStatus::Completed => "completed",
        }
    }

    fn from_input(value: &Value) -> Result<Self, ValidationError> {
        value
            .as_str()
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| ValidationError::UnknownVariant {
                field: "status",
                value: variant_text(value),
            })
    }
}

impl fmt::Display for PromiseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromiseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromiseStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownVariant {
                field: "status",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElectionPromise {
    pub id: String,
    pub candidate_id: String,
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: PromiseStatus,
    #[serde(deserialize_with = "null_as_default")]
    pub completion_percentage: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub proof_links: Vec<String>,
    pub completion_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn percentage_write(value: &Value) -> Result<f64, ValidationError> {
    finite_number(value)
        .map(clamp_percentage)
        .ok_or(ValidationError::InvalidType {
            field: "completionPercentage",
            expected: "a number",
        })
}

/// Build the creation patch. `candidateId` and `title` are required; `status` must be
/// one of the three known labels when supplied.
fn creation_patch(input: &Input) -> Result<Patch, ValidationError> {
    let candidate_id = required_text(input, "candidateId")?;
    let title = required_text(input, "title")?;
    let status = match input.get("status") {
        None | Some(Value::Null) => PromiseStatus::default(),
        Some(value) => PromiseStatus::from_input(value)?,
    };
    let completion = input
        .get("completionPercentage")
        .and_then(finite_number)
        .map_or(0.0, clamp_percentage);
    let completion_date = provided_date(input, "completionDate")?.flatten();

    Ok(Patch::new()
        .set("candidateId", candidate_id)
        .set("title", title)
        .set("description", text_or_empty(input, "description"))
        .set("category", text_or_empty(input, "category"))
        .set("status", status.as_str())
        .set("completionPercentage", completion)
        .set("proofLinks", links_or_empty(input, "proofLinks"))
        .set("completionDate", date_value(completion_date))
        .server_timestamp("createdAt")
        .server_timestamp("lastUpdated"))
}

/// Build the update patch from explicitly supplied fields only. Returns an empty patch
/// when nothing was supplied.
fn update_patch(input: &Input) -> Result<Patch, ValidationError> {
    let mut patch = Patch::new();

    if let Some(title) = provided_text(input, "title")? {
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyText { field: "title" });
        }
        patch = patch.set("title", title);
    }
    if let Some(description) = provided_text(input, "description")? {
        patch = patch.set("description", description);
    }
    if let Some(category) = provided_text(input, "category")? {
        patch = patch.set("category", category);
    }
    if let Some(value) = input.get("status") {
        patch = patch.set("status", PromiseStatus::from_input(value)?.as_str());
    }
    if let Some(value) = input.get("completionPercentage") {
        patch = patch.set("completionPercentage", percentage_write(value)?);
    }
    if let Some(links) = provided_links(input, "proofLinks")? {
        patch = patch.set("proofLinks", links);
    }
    if let Some(date) = provided_date(input, "completionDate")? {
        patch = patch.set("completionDate", date_value(date));
    }

    Ok(patch)
}

/// Access service for the `promises` collection.
pub struct PromiseService<S> {
    store: Arc<S>,
}

impl<S> Clone for PromiseService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> PromiseService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: &Input) -> AccessResult<String> {
        let patch = creation_patch(input)?;
        let id = self.store.add(COLLECTION, patch).await?;
        info!(promise_id = %id, "promise created");
        Ok(id)
    }

    /// Apply the supplied fields and stamp `lastUpdated`. A payload with no
    /// recognised fields leaves the document untouched.
    pub async fn update(&self, id: &str, input: &Input) -> AccessResult<WriteOutcome> {
        if id.trim().is_empty() {
            return Ok(WriteOutcome::Skipped);
        }

        let patch = update_patch(input)?;
        if patch.is_empty() {
            debug!(promise_id = %id, "promise update carried no fields");
            return Ok(WriteOutcome::Skipped);
        }

        self.store
            .update(COLLECTION, id, patch.server_timestamp("lastUpdated"))
            .await?;
        Ok(WriteOutcome::Applied)
    }

    pub async fn delete(&self, id: &str) -> AccessResult<()> {
        require_id(id, "id")?;
        self.store.delete(COLLECTION, id).await?;
        info!(promise_id = %id, "promise deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> AccessResult<Option<ElectionPromise>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        match self.store.get(COLLECTION, id).await? {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn require(&self, id: &str) -> AccessResult<ElectionPromise> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AccessError::not_found(COLLECTION, id))
    }

    pub async fn list_all(&self) -> AccessResult<Vec<ElectionPromise>> {
        let documents = self.store.query(COLLECTION, &Query::all()).await?;
        Ok(decode_all(COLLECTION, documents))
    }

    pub async fn list_by_candidate(&self, candidate_id: &str) -> AccessResult<Vec<ElectionPromise>> {
        if candidate_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::all().where_eq("candidateId", candidate_id);
        let documents = self.store.query(COLLECTION, &query).await?;
        Ok(decode_all(COLLECTION, documents))
    }
}
