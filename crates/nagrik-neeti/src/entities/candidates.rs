use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::error::{AccessError, AccessResult, ValidationError, WriteOutcome};
use super::input::{finite_number, require_id, Input};
use super::schema::{FieldKind, FieldSpec, Schema};
use super::{decode_all, null_as_default};
use crate::aggregate;
use crate::store::{Collection, DocumentStore, Patch, Query};

const COLLECTION: Collection = Collection::Candidates;

/// Fields accepted on candidate writes. Verification fields are excluded and only
/// change through [`CandidateService::verify`] and [`CandidateService::reject`].
pub const CANDIDATE_SCHEMA: Schema = Schema::new(&[
    FieldSpec::new("name", FieldKind::Text),
    FieldSpec::new("party", FieldKind::Text),
    FieldSpec::new("education", FieldKind::Text),
    FieldSpec::new("transparencyScore", FieldKind::Score),
    FieldSpec::new("promisesTotal", FieldKind::Number),
    FieldSpec::new("promisesCompleted", FieldKind::Number),
    FieldSpec::new("profileImage", FieldKind::Text),
    FieldSpec::new("constituency", FieldKind::Text),
    FieldSpec::new("criminalCases", FieldKind::List),
    FieldSpec::new("assets", FieldKind::Object),
    FieldSpec::new("liabilities", FieldKind::Object),
    FieldSpec::new("pastPerformance", FieldKind::Text),
    FieldSpec::new("politicalHistory", FieldKind::List),
    FieldSpec::new("fundsAllocated", FieldKind::Number),
    FieldSpec::new("fundsUtilized", FieldKind::Number),
]);

/// Asset or liability disclosure: `{ total, details[] }` as entered by administrators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Disclosure(pub Map<String, Value>);

impl Disclosure {
    pub fn total(&self) -> f64 {
        self.0
            .get("total")
            .and_then(finite_number)
            .unwrap_or(0.0)
    }

    pub fn details(&self) -> Vec<&str> {
        self.0
            .get("details")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Candidate {
    pub id: String,
    pub name: Option<String>,
    pub party: Option<String>,
    pub constituency: Option<String>,
    pub education: Option<String>,
    pub funds_allocated: Option<f64>,
    pub funds_utilized: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub assets: Disclosure,
    #[serde(deserialize_with = "null_as_default")]
    pub liabilities: Disclosure,
    pub past_performance: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub political_history: Vec<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub criminal_cases: Vec<Value>,
    pub transparency_score: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub verified: bool,
    pub verification_notes: Option<String>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub promises_total: Option<f64>,
    pub promises_completed: Option<f64>,
    pub profile_image: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    pub fn party_or_independent(&self) -> &str {
        match self.party.as_deref() {
            Some(party) if !party.is_empty() => party,
            _ => "Independent",
        }
    }

    pub fn fulfillment_percentage(&self) -> i64 {
        aggregate::fulfillment_percentage(self)
    }

    pub fn fund_utilization_percentage(&self) -> i64 {
        aggregate::fund_utilization_percentage(self)
    }
}

/// Full field set for a new candidate; malformed values become null, `[]` or `{}`.
pub fn sanitize_for_create(input: &Input) -> Map<String, Value> {
    CANDIDATE_SCHEMA.sanitize_for_create(input)
}

/// True partial patch: only supplied, well-typed fields survive.
pub fn sanitize_for_update(input: &Input) -> Map<String, Value> {
    CANDIDATE_SCHEMA.sanitize_for_update(input)
}

/// `(lesser, greater)` field pairs where the first may never exceed the second.
const BOUNDED_PAIRS: [(&str, &str); 2] = [
    ("promisesCompleted", "promisesTotal"),
    ("fundsUtilized", "fundsAllocated"),
];

fn check_invariants(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    for (lesser, greater) in BOUNDED_PAIRS {
        let part = fields.get(lesser).and_then(finite_number);
        let whole = fields.get(greater).and_then(finite_number);
        if let (Some(part), Some(whole)) = (part, whole) {
            if part > whole {
                return Err(ValidationError::Exceeds { lesser, greater });
            }
        }
    }
    Ok(())
}

/// Access service for the `candidates` collection.
pub struct CandidateService<S> {
    store: Arc<S>,
}

impl<S> Clone for CandidateService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> CandidateService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Sanitize, stamp `createdAt`, and persist. Returns the new document id.
    pub async fn create(&self, input: &Input) -> AccessResult<String> {
        let fields = sanitize_for_create(input);
        check_invariants(&fields)?;

        let patch = Patch::from_map(fields).server_timestamp("createdAt");
        let id = self.store.add(COLLECTION, patch).await?;
        info!(candidate_id = %id, "candidate created");
        Ok(id)
    }

    /// Merge only the supplied, well-typed fields. Nothing is written when `id` is
    /// blank or the sanitized patch is empty.
    pub async fn update(&self, id: &str, input: &Input) -> AccessResult<WriteOutcome> {
        if id.trim().is_empty() {
            return Ok(WriteOutcome::Skipped);
        }

        let fields = sanitize_for_update(input);
        if fields.is_empty() {
            debug!(candidate_id = %id, "candidate update carried no valid fields");
            return Ok(WriteOutcome::Skipped);
        }
        self.check_merged_invariants(id, &fields).await?;

        let patch = Patch::from_map(fields).server_timestamp("updatedAt");
        self.store.update(COLLECTION, id, patch).await?;
        Ok(WriteOutcome::Applied)
    }

    /// A patch carrying one side of a bounded pair is checked against the stored other
    /// side, so partial updates cannot leave the document past 100%.
    async fn check_merged_invariants(
        &self,
        id: &str,
        fields: &Map<String, Value>,
    ) -> AccessResult<()> {
        let one_sided: Vec<&str> = BOUNDED_PAIRS
            .iter()
            .filter(|(lesser, greater)| fields.contains_key(*lesser) != fields.contains_key(*greater))
            .flat_map(|(lesser, greater)| [*lesser, *greater])
            .filter(|field| !fields.contains_key(*field))
            .collect();
        if one_sided.is_empty() {
            return Ok(check_invariants(fields)?);
        }

        let stored = self
            .store
            .get(COLLECTION, id)
            .await?
            .ok_or_else(|| AccessError::not_found(COLLECTION, id))?;
        let mut merged = fields.clone();
        for field in one_sided {
            if let Some(value) = stored.get(field) {
                merged.insert(field.to_string(), value.clone());
            }
        }
        Ok(check_invariants(&merged)?)
    }

    pub async fn delete(&self, id: &str) -> AccessResult<()> {
        require_id(id, "id")?;
        self.store.delete(COLLECTION, id).await?;
        info!(candidate_id = %id, "candidate deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> AccessResult<Option<Candidate>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        match self.store.get(COLLECTION, id).await? {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(&self) -> AccessResult<Vec<Candidate>> {
        let documents = self.store.query(COLLECTION, &Query::all()).await?;
        Ok(decode_all(COLLECTION, documents))
    }

    pub async fn list_by_constituency(&self, constituency: &str) -> AccessResult<Vec<Candidate>> {
        if constituency.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::all().where_eq("constituency", constituency);
        let documents = self.store.query(COLLECTION, &query).await?;
        Ok(decode_all(COLLECTION, documents))
    }

    /// Sorted, de-duplicated, non-empty constituency names.
    pub async fn list_constituencies(&self) -> AccessResult<Vec<String>> {
        let documents = self.store.query(COLLECTION, &Query::all()).await?;
        let constituencies: BTreeSet<String> = documents
            .iter()
            .filter_map(|document| document.get("constituency").and_then(Value::as_str))
            .filter(|constituency| !constituency.is_empty())
            .map(str::to_string)
            .collect();
        Ok(constituencies.into_iter().collect())
    }

    pub async fn list_unverified(&self) -> AccessResult<Vec<Candidate>> {
        let candidates = self.list_all().await?;
        Ok(candidates
            .into_iter()
            .filter(|candidate| !candidate.verified && candidate.rejected_at.is_none())
            .collect())
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
        info!(candidate_id = %id, reviewer, "candidate verified");
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
        info!(candidate_id = %id, reviewer, "candidate rejected");
        Ok(())
    }

    /// Fetch a candidate that must exist.
    pub async fn require(&self, id: &str) -> AccessResult<Candidate> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AccessError::not_found(COLLECTION, id))
    }
}
