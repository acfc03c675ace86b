//! Page-level context: every entity service over one shared store, plus the composite
//! reads the dashboard, profile and comparison pages need.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{self, DashboardOverview, FundRow, RankedCandidate, ReportStats, Scorecard};
use crate::compare::{self, Comparison};
use crate::entities::{
    AccessResult, AnalyticsService, CandidateService, FeedbackService, PromiseService,
    ReportService, UserService, ValidationError,
};
use crate::filters::CatalogSnapshot;
use crate::storage::{ObjectStore, Uploader};
use crate::store::DocumentStore;

pub const TOP_PERFORMER_LIMIT: usize = 5;
const ANONYMOUS: &str = "Anonymous";

/// Admin dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub overview: DashboardOverview,
    pub top_performers: Vec<RankedCandidate>,
    pub fulfillment_chart: Vec<RankedCandidate>,
    pub fund_chart: Vec<FundRow>,
}

pub struct Portal<S, O> {
    pub candidates: CandidateService<S>,
    pub promises: PromiseService<S>,
    pub feedback: FeedbackService<S>,
    pub reports: ReportService<S>,
    pub users: UserService<S>,
    pub analytics: AnalyticsService<S>,
    pub uploads: Uploader<O>,
}

impl<S, O> Clone for Portal<S, O> {
    fn clone(&self) -> Self {
        Self {
            candidates: self.candidates.clone(),
            promises: self.promises.clone(),
            feedback: self.feedback.clone(),
            reports: self.reports.clone(),
            users: self.users.clone(),
            analytics: self.analytics.clone(),
            uploads: self.uploads.clone(),
        }
    }
}

impl<S: DocumentStore, O: ObjectStore> Portal<S, O> {
    pub fn new(store: Arc<S>, objects: Arc<O>) -> Self {
        Self {
            candidates: CandidateService::new(Arc::clone(&store)),
            promises: PromiseService::new(Arc::clone(&store)),
            feedback: FeedbackService::new(Arc::clone(&store)),
            reports: ReportService::new(Arc::clone(&store)),
            users: UserService::new(Arc::clone(&store)),
            analytics: AnalyticsService::new(store),
            uploads: Uploader::new(objects),
        }
    }

    /// Fetch all four listing collections at one refresh point.
    pub async fn snapshot(&self) -> AccessResult<CatalogSnapshot> {
        let (candidates, promises, feedback, reports) = tokio::try_join!(
            self.candidates.list_all(),
            self.promises.list_all(),
            self.feedback.list_all(),
            self.reports.list_all(),
        )?;
        Ok(CatalogSnapshot {
            candidates,
            promises,
            feedback,
            reports,
        })
    }

    pub async fn scorecard(&self, candidate_id: &str) -> AccessResult<Scorecard> {
        let candidate = self.candidates.require(candidate_id).await?;
        let (promises, reports, feedback) = tokio::try_join!(
            self.promises.list_by_candidate(candidate_id),
            self.reports.list_by_candidate(candidate_id),
            self.feedback.list_by_candidate(candidate_id),
        )?;
        Ok(Scorecard::new(candidate, promises, reports, &feedback))
    }

    pub async fn dashboard(&self) -> AccessResult<Dashboard> {
        let (candidates, promises) =
            tokio::try_join!(self.candidates.list_all(), self.promises.list_all())?;
        Ok(Dashboard {
            overview: aggregate::dashboard_overview(&candidates, &promises),
            top_performers: aggregate::top_performers(&candidates, TOP_PERFORMER_LIMIT),
            fulfillment_chart: aggregate::fulfillment_chart(&candidates),
            fund_chart: aggregate::fund_chart(&candidates),
        })
    }

    pub async fn report_stats(&self) -> AccessResult<ReportStats> {
        let (candidates, reports) =
            tokio::try_join!(self.candidates.list_all(), self.reports.list_all())?;
        Ok(aggregate::report_stats(&candidates, &reports))
    }

    pub async fn compare(&self, left_id: &str, right_id: &str) -> AccessResult<Comparison> {
        let (left, right) = tokio::try_join!(
            self.candidates.require(left_id),
            self.candidates.require(right_id),
        )?;
        Ok(compare::compare(&left, &right))
    }

    /// Create feedback on behalf of a signed-in user. The author fields come from the
    /// caller's identity and profile rather than the payload, and the candidate must
    /// exist.
    pub async fn submit_feedback(
        &self,
        uid: &str,
        mut input: serde_json::Map<String, Value>,
    ) -> AccessResult<String> {
        if uid.trim().is_empty() {
            return Err(ValidationError::MissingField("userId").into());
        }
        let candidate_id = input
            .get("candidateId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if candidate_id.trim().is_empty() {
            return Err(ValidationError::MissingField("candidateId").into());
        }
        self.candidates.require(&candidate_id).await?;

        let profile = self.users.get_by_id(uid).await?;
        let author = profile
            .as_ref()
            .and_then(|profile| profile.name.clone().filter(|name| !name.trim().is_empty()))
            .or_else(|| {
                profile
                    .as_ref()
                    .map(|profile| profile.email.clone())
                    .filter(|email| !email.trim().is_empty())
            })
            .or_else(|| {
                input
                    .get("userName")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .filter(|name| !name.trim().is_empty())
            })
            .unwrap_or_else(|| ANONYMOUS.to_string());

        input.insert("userId".to_string(), Value::String(uid.to_string()));
        input.insert("userName".to_string(), Value::String(author));
        self.feedback.create(&input).await
    }
}
