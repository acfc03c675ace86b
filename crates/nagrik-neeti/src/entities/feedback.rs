use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::decode_all;
use super::error::{AccessError, AccessResult, ValidationError, WriteOutcome};
use super::input::{bounded_text, finite_number, require_id, required_text, Input};
use crate::aggregate::{self, FeedbackSummary};
use crate::store::{Collection, DocumentStore, Patch, Query};

const COLLECTION: Collection = Collection::Feedback;

pub const MAX_FEEDBACK_CHARS: usize = 5000;
pub const DEFAULT_RATING: i64 = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Feedback {
    pub id: String,
    pub candidate_id: String,
    pub user_id: String,
    pub user_name: String,
    pub feedback_text: String,
    pub rating: Option<f64>,
    pub is_positive: Option<bool>,
    pub verified: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Feedback {
    /// Rating used for averages; a missing or zero rating counts as the default.
    pub fn effective_rating(&self) -> f64 {
        match self.rating {
            Some(rating) if rating != 0.0 => rating,
            _ => DEFAULT_RATING as f64,
        }
    }
}

/// Round to the nearest star and clamp into 1..=5; non-numeric input yields the default.
pub fn clamp_rating(value: Option<&Value>) -> i64 {
    value
        .and_then(finite_number)
        .map_or(DEFAULT_RATING, |rating| rating.round().clamp(1.0, 5.0) as i64)
}

fn creation_patch(input: &Input) -> Result<Patch, ValidationError> {
    let candidate_id = required_text(input, "candidateId")?;
    let user_id = required_text(input, "userId")?;
    let user_name = required_text(input, "userName")?;
    let text = bounded_text(input.get("feedbackText"), "feedbackText", MAX_FEEDBACK_CHARS)?;
    let is_positive = match input.get("isPositive") {
        Some(Value::Bool(flag)) => Value::Bool(*flag),
        _ => Value::Null,
    };

    Ok(Patch::new()
        .set("candidateId", candidate_id)
        .set("userId", user_id)
        .set("userName", user_name)
        .set("feedbackText", text)
        .set("rating", clamp_rating(input.get("rating")))
        .set("verified", true)
        .set("isPositive", is_positive)
        .server_timestamp("createdAt"))
}

fn update_patch(input: &Input) -> Result<Patch, ValidationError> {
    let mut patch = Patch::new();

    if let Some(text) = input.get("feedbackText") {
        patch = patch.set(
            "feedbackText",
            bounded_text(Some(text), "feedbackText", MAX_FEEDBACK_CHARS)?,
        );
    }
    if let Some(rating) = input.get("rating") {
        if finite_number(rating).is_none() {
            return Err(ValidationError::InvalidType {
                field: "rating",
                expected: "a number",
            });
        }
        patch = patch.set("rating", clamp_rating(Some(rating)));
    }
    match input.get("isPositive") {
        None => {}
        Some(value @ (Value::Bool(_) | Value::Null)) => {
            patch = patch.set("isPositive", value.clone());
        }
        Some(_) => {
            return Err(ValidationError::InvalidType {
                field: "isPositive",
                expected: "true, false or null",
            })
        }
    }

    Ok(patch)
}

/// Access service for the `feedback` collection. Every listing is newest first.
pub struct FeedbackService<S> {
    store: Arc<S>,
}

impl<S> Clone for FeedbackService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> FeedbackService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Store feedback from an authenticated author. Authentication is the only gate,
    /// so the entry is marked verified immediately.
    pub async fn create(&self, input: &Input) -> AccessResult<String> {
        let patch = creation_patch(input)?;
        let id = self.store.add(COLLECTION, patch).await?;
        info!(feedback_id = %id, "feedback created");
        Ok(id)
    }

    pub async fn update(&self, id: &str, input: &Input) -> AccessResult<WriteOutcome> {
        if id.trim().is_empty() {
            return Ok(WriteOutcome::Skipped);
        }

        let patch = update_patch(input)?;
        if patch.is_empty() {
            debug!(feedback_id = %id, "feedback update carried no fields");
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
        info!(feedback_id = %id, "feedback deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> AccessResult<Option<Feedback>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        match self.store.get(COLLECTION, id).await? {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn require(&self, id: &str) -> AccessResult<Feedback> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AccessError::not_found(COLLECTION, id))
    }

    pub async fn list_all(&self) -> AccessResult<Vec<Feedback>> {
        let query = Query::all().order_by_desc("createdAt");
        let documents = self.store.query(COLLECTION, &query).await?;
        Ok(decode_all(COLLECTION, documents))
    }

    pub async fn list_by_candidate(&self, candidate_id: &str) -> AccessResult<Vec<Feedback>> {
        if candidate_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::all()
            .where_eq("candidateId", candidate_id)
            .order_by_desc("createdAt");
        let documents = self.store.query(COLLECTION, &query).await?;
        Ok(decode_all(COLLECTION, documents))
    }

    /// The first feedback entry `user_id` left on `candidate_id`, if any.
    pub async fn user_feedback_for_candidate(
        &self,
        candidate_id: &str,
        user_id: &str,
    ) -> AccessResult<Option<Feedback>> {
        if candidate_id.trim().is_empty() || user_id.trim().is_empty() {
            return Ok(None);
        }
        let query = Query::all()
            .where_eq("candidateId", candidate_id)
            .where_eq("userId", user_id);
        let documents = self.store.query(COLLECTION, &query).await?;
        Ok(decode_all::<Feedback>(COLLECTION, documents).into_iter().next())
    }

    pub async fn average_rating(&self, candidate_id: &str) -> AccessResult<f64> {
        let feedback = self.list_by_candidate(candidate_id).await?;
        Ok(aggregate::average_rating(&feedback))
    }

    pub async fn summary(&self, candidate_id: &str) -> AccessResult<FeedbackSummary> {
        let feedback = self.list_by_candidate(candidate_id).await?;
        Ok(aggregate::feedback_summary(&feedback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> Input {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn ratings_round_then_clamp() {
        assert_eq!(clamp_rating(Some(&json!(7))), 5);
        assert_eq!(clamp_rating(Some(&json!(0.2))), 1);
        assert_eq!(clamp_rating(Some(&json!(3.5))), 4);
        assert_eq!(clamp_rating(Some(&json!("five"))), 3);
        assert_eq!(clamp_rating(None), 3);
    }

    #[test]
    fn creation_forces_verified_and_normalizes_tri_state() {
        let patch = creation_patch(&input(json!({
            "candidateId": "c1",
            "userId": "u1",
            "userName": "Asha",
            "feedbackText": "  Delivered the new school  ",
            "isPositive": "yes",
            "verified": false,
        })))
        .expect("valid feedback");

        assert_eq!(patch.value("verified"), Some(&json!(true)));
        assert_eq!(patch.value("isPositive"), Some(&Value::Null));
        assert_eq!(
            patch.value("feedbackText"),
            Some(&json!("Delivered the new school"))
        );
        assert_eq!(patch.value("rating"), Some(&json!(3)));
    }

    #[test]
    fn creation_rejects_oversized_text() {
        let long = "x".repeat(MAX_FEEDBACK_CHARS + 1);
        let err = creation_patch(&input(json!({
            "candidateId": "c1",
            "userId": "u1",
            "userName": "Asha",
            "feedbackText": long,
        })))
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::TextTooLong {
                field: "feedbackText",
                max: MAX_FEEDBACK_CHARS
            }
        );
    }

    #[test]
    fn update_accepts_explicit_null_sentiment() {
        let patch = update_patch(&input(json!({ "isPositive": null }))).expect("valid update");
        assert_eq!(patch.value("isPositive"), Some(&Value::Null));

        let empty = update_patch(&input(json!({ "userId": "someone-else" }))).expect("no fields");
        assert!(empty.is_empty());
    }

    #[test]
    fn zero_rating_counts_as_default() {
        let entry = Feedback {
            rating: Some(0.0),
            ..Feedback::default()
        };
        assert_eq!(entry.effective_rating(), 3.0);
    }
}
