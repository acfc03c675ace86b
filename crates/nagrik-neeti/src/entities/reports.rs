use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::error::{AccessError, AccessResult, ValidationError, WriteOutcome};
use super::input::{
    links_or_empty, provided_flag, provided_links, provided_text, require_id, required_text,
    text_or_empty, variant_text, Input,
};
use super::{decode_all, null_as_default};
use crate::store::{Collection, DocumentStore, Patch, Query};

const COLLECTION: Collection = Collection::Reports;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    #[default]
    Criminal,
    Asset,
    Performance,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::Criminal,
        ReportKind::Asset,
        ReportKind::Performance,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ReportKind::Criminal => "criminal",
            ReportKind::Asset => "asset",
            ReportKind::Performance => "performance",
        }
    }

    fn from_input(value: &Value) -> Result<Self, ValidationError> {
        value
            .as_str()
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| ValidationError::UnknownVariant {
                field: "type",
                value: variant_text(value),
            })
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownVariant {
                field: "type",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    pub id: String,
    pub candidate_id: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: ReportKind,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub verified: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub document_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub document_links: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub uploaded_by: String,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub verification_notes: Option<String>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn is_pending(&self) -> bool {
        !self.verified && self.rejected_at.is_none()
    }
}

fn creation_patch(input: &Input) -> Result<Patch, ValidationError> {
    let candidate_id = required_text(input, "candidateId")?;
    let kind = match input.get("type") {
        None | Some(Value::Null) => ReportKind::default(),
        Some(Value::String(raw)) if raw.is_empty() => ReportKind::default(),
        Some(value) => ReportKind::from_input(value)?,
    };
    let verified = provided_flag(input, "verified")?.unwrap_or(false);

    Ok(Patch::new()
        .set("candidateId", candidate_id)
        .set("type", kind.as_str())
        .set("source", text_or_empty(input, "source"))
        .set("description", text_or_empty(input, "description"))
        .set("verified", verified)
        .set("documentUrl", text_or_empty(input, "documentUrl"))
        .set("documentLinks", links_or_empty(input, "documentLinks"))
        .set("uploadedBy", text_or_empty(input, "uploadedBy"))
        .server_timestamp("uploadedAt"))
}

fn update_patch(input: &Input) -> Result<Patch, ValidationError> {
    let mut patch = Patch::new();

    if let Some(value) = input.get("type") {
        patch = patch.set("type", ReportKind::from_input(value)?.as_str());
    }
    for field in ["source", "description", "documentUrl"] {
        if let Some(text) = provided_text(input, field)? {
            patch = patch.set(field, text);
        }
    }
    if let Some(verified) = provided_flag(input, "verified")? {
        patch = patch.set("verified", verified);
    }
    if let Some(links) = provided_links(input, "documentLinks")? {
        patch = patch.set("documentLinks", links);
    }

    Ok(patch)
}

/// Access service for the `reports` collection.
pub struct ReportService<S> {
    store: Arc<S>,
}

impl<S> Clone for ReportService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> ReportService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: &Input) -> AccessResult<String> {
        let patch = creation_patch(input)?;
        let id = self.store.add(COLLECTION, patch).await?;
        info!(report_id = %id, "report created");
        Ok(id)
    }

    pub async fn update(&self, id: &str, input: &Input) -> AccessResult<WriteOutcome> {
        if id.trim().is_empty() {
            return Ok(WriteOutcome::Skipped);
        }

        let patch = update_patch(input)?;
        if patch.is_empty() {
            debug!(report_id = %id, "report update carried no fields");
            return Ok(WriteOutcome::Skipped);
        }

        self.store.update(COLLECTION, id, patch).await?;
        Ok(WriteOutcome::Applied)
    }

    pub async fn delete(&self, id: &str) -> AccessResult<()> {
        require_id(id, "id")?;
        self.store.delete(COLLECTION, id).await?;
        info!(report_id = %id, "report deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> AccessResult<Option<Report>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        match self.store.get(COLLECTION, id).await? {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn require(&self, id: &str) -> AccessResult<Report> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AccessError::not_found(COLLECTION, id))
    }

    pub async fn list_all(&self) -> AccessResult<Vec<Report>> {
        let documents = self.store.query(COLLECTION, &Query::all()).await?;
        Ok(decode_all(COLLECTION, documents))
    }

    pub async fn list_by_candidate(&self, candidate_id: &str) -> AccessResult<Vec<Report>> {
        if candidate_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::all().where_eq("candidateId", candidate_id);
        let documents = self.store.query(COLLECTION, &query).await?;
        Ok(decode_all(COLLECTION, documents))
    }

    pub async fn list_by_type(&self, kind: ReportKind) -> AccessResult<Vec<Report>> {
        let query = Query::all().where_eq("type", kind.as_str());
        let documents = self.store.query(COLLECTION, &query).await?;
        Ok(decode_all(COLLECTION, documents))
    }

    /// Reports neither verified nor rejected yet.
    pub async fn list_unverified(&self) -> AccessResult<Vec<Report>> {
        let reports = self.list_all().await?;
        Ok(reports.into_iter().filter(Report::is_pending).collect())
    }

    pub async fn verify(&self, id: &str, reviewer: &str, notes: Option<&str>) -> AccessResult<()> {
        require_id(id, "id")?;
        require_id(reviewer, "verifiedBy")?;

        let notes = notes
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map_or(Value::Null, |notes| Value::String(notes.to_string()));
        let patch = Patch::new()
            .set("verified", true)
            .set("verificationNotes", notes)
            .set("verifiedBy", reviewer)
            .server_timestamp("verifiedAt")
            .set("rejectionReason", Value::Null)
            .set("rejectedBy", Value::Null)
            .set("rejectedAt", Value::Null);

        self.store.update(COLLECTION, id, patch).await?;
        info!(report_id = %id, reviewer, "report verified");
        Ok(())
    }

    pub async fn reject(&self, id: &str, reviewer: &str, reason: Option<&str>) -> AccessResult<()> {
        require_id(id, "id")?;
        require_id(reviewer, "rejectedBy")?;

        let reason = reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or("Rejected by admin");
        let patch = Patch::new()
            .set("verified", false)
            .set("verificationNotes", Value::Null)
            .set("verifiedBy", Value::Null)
            .set("verifiedAt", Value::Null)
            .set("rejectionReason", reason)
            .set("rejectedBy", reviewer)
            .server_timestamp("rejectedAt");

        self.store.update(COLLECTION, id, patch).await?;
        info!(report_id = %id, reviewer, "report rejected");
        Ok(())
    }
}
