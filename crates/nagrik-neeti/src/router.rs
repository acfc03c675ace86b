//! HTTP surface over [`Portal`].
//!
//! The auth provider sits in front of the service and forwards the signed-in uid in the
//! `x-user-id` header. Public reads need no identity; writes need one, and catalogue
//! maintenance additionally needs the admin role.

use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::aggregate;
use crate::entities::{AccessError, Candidate, Report, WriteOutcome};
use crate::error::AppError;
use crate::filters::{
    distinct_categories, distinct_report_types, filter_reports, group_feedback, group_promises,
    search_candidates, CandidateSearch, FeedbackFilter, PromiseFilter, ReportFilter,
};
use crate::portal::Portal;
use crate::storage::ObjectStore;
use crate::store::{Collection, DocumentStore};

pub const USER_HEADER: &str = "x-user-id";

type Shared<S, O> = State<Arc<Portal<S, O>>>;
type ApiResult<T> = Result<T, AppError>;

/// Uid of the signed-in caller, taken from [`USER_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub String);

#[async_trait]
impl<T: Send + Sync> FromRequestParts<T> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &T) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .map(|uid| Caller(uid.to_string()))
            .ok_or_else(|| AccessError::Forbidden("sign in required".to_string()).into())
    }
}

/// Router builder exposing every entity service under `/api/v1`.
pub fn portal_router<S, O>(portal: Arc<Portal<S, O>>) -> Router
where
    S: DocumentStore + 'static,
    O: ObjectStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/candidates",
            get(list_candidates::<S, O>).post(create_candidate::<S, O>),
        )
        .route(
            "/api/v1/candidates/constituencies",
            get(list_constituencies::<S, O>),
        )
        .route(
            "/api/v1/candidates/unverified",
            get(list_unverified_candidates::<S, O>),
        )
        .route(
            "/api/v1/candidates/:id",
            get(get_candidate::<S, O>)
                .patch(update_candidate::<S, O>)
                .delete(delete_candidate::<S, O>),
        )
        .route(
            "/api/v1/candidates/:id/scorecard",
            get(candidate_scorecard::<S, O>),
        )
        .route(
            "/api/v1/candidates/:id/promises",
            get(candidate_promises::<S, O>),
        )
        .route(
            "/api/v1/candidates/:id/feedback",
            get(candidate_feedback::<S, O>),
        )
        .route(
            "/api/v1/candidates/:id/feedback/mine",
            get(own_candidate_feedback::<S, O>),
        )
        .route(
            "/api/v1/candidates/:id/verify",
            post(verify_candidate::<S, O>),
        )
        .route(
            "/api/v1/candidates/:id/reject",
            post(reject_candidate::<S, O>),
        )
        .route(
            "/api/v1/promises",
            get(list_promises::<S, O>).post(create_promise::<S, O>),
        )
        .route("/api/v1/promises/categories", get(promise_categories::<S, O>))
        .route(
            "/api/v1/promises/:id",
            get(get_promise::<S, O>)
                .patch(update_promise::<S, O>)
                .delete(delete_promise::<S, O>),
        )
        .route(
            "/api/v1/feedback",
            get(list_feedback::<S, O>).post(create_feedback::<S, O>),
        )
        .route(
            "/api/v1/feedback/:id",
            get(get_feedback::<S, O>)
                .patch(update_feedback::<S, O>)
                .delete(delete_feedback::<S, O>),
        )
        .route(
            "/api/v1/reports",
            get(list_reports::<S, O>).post(create_report::<S, O>),
        )
        .route("/api/v1/reports/stats", get(report_stats::<S, O>))
        .route("/api/v1/reports/types", get(report_types::<S, O>))
        .route(
            "/api/v1/reports/unverified",
            get(list_unverified_reports::<S, O>),
        )
        .route(
            "/api/v1/reports/:id",
            get(get_report::<S, O>)
                .patch(update_report::<S, O>)
                .delete(delete_report::<S, O>),
        )
        .route("/api/v1/reports/:id/verify", post(verify_report::<S, O>))
        .route("/api/v1/reports/:id/reject", post(reject_report::<S, O>))
        .route(
            "/api/v1/users",
            get(list_users::<S, O>).post(register_user::<S, O>),
        )
        .route("/api/v1/users/me", get(current_user::<S, O>))
        .route("/api/v1/users/:uid", patch(update_user::<S, O>))
        .route("/api/v1/analytics/views", get(list_page_views::<S, O>))
        .route(
            "/api/v1/analytics/views/:page",
            get(get_page_views::<S, O>).post(record_page_view::<S, O>),
        )
        .route(
            "/api/v1/analytics/candidates",
            get(candidate_stats::<S, O>),
        )
        .route("/api/v1/analytics/dashboard", get(dashboard::<S, O>))
        .route("/api/v1/compare", get(compare_candidates::<S, O>))
        .route("/api/v1/compare/csv", get(compare_candidates_csv::<S, O>))
        .route(
            "/api/v1/uploads/candidate-images",
            post(upload_candidate_image::<S, O>),
        )
        .route("/api/v1/uploads/documents", post(upload_document::<S, O>))
        .with_state(portal)
}

fn created(id: String) -> Response {
    (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
}

fn outcome(outcome: WriteOutcome) -> Json<Value> {
    Json(json!({ "outcome": outcome }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ReviewBody {
    notes: Option<String>,
    reason: Option<String>,
}

async fn list_candidates<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Query(search): Query<CandidateSearch>,
) -> ApiResult<Json<Vec<Candidate>>> {
    let candidates = portal.candidates.list_all().await?;
    let matching = search_candidates(&candidates, &search)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(matching))
}

async fn create_candidate<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Json(input): Json<Map<String, Value>>,
) -> ApiResult<Response> {
    portal.users.require_admin(&uid).await?;
    Ok(created(portal.candidates.create(&input).await?))
}

async fn list_constituencies<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(portal.candidates.list_constituencies().await?))
}

async fn list_unverified_candidates<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
) -> ApiResult<Json<Vec<Candidate>>> {
    portal.users.require_admin(&uid).await?;
    Ok(Json(portal.candidates.list_unverified().await?))
}

async fn get_candidate<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Path(id): Path<String>,
) -> ApiResult<Json<Candidate>> {
    Ok(Json(portal.candidates.require(&id).await?))
}

async fn update_candidate<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    portal.users.require_admin(&uid).await?;
    Ok(outcome(portal.candidates.update(&id, &input).await?))
}

async fn delete_candidate<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    portal.users.require_admin(&uid).await?;
    portal.candidates.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn candidate_scorecard<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    Ok(Json(portal.scorecard(&id).await?).into_response())
}

async fn candidate_promises<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    Ok(Json(portal.promises.list_by_candidate(&id).await?).into_response())
}

async fn candidate_feedback<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let feedback = portal.feedback.list_by_candidate(&id).await?;
    let summary = aggregate::feedback_summary(&feedback);
    Ok(Json(json!({ "summary": summary, "feedback": feedback })).into_response())
}

async fn own_candidate_feedback<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let entry = portal.feedback.user_feedback_for_candidate(&id, &uid).await?;
    Ok(Json(entry).into_response())
}

async fn verify_candidate<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
    body: Option<Json<ReviewBody>>,
) -> ApiResult<StatusCode> {
    portal.users.require_admin(&uid).await?;
    let body = body.map(|Json(body)| body).unwrap_or_default();
    portal
        .candidates
        .verify(&id, &uid, body.notes.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reject_candidate<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
    body: Option<Json<ReviewBody>>,
) -> ApiResult<StatusCode> {
    portal.users.require_admin(&uid).await?;
    let body = body.map(|Json(body)| body).unwrap_or_default();
    portal
        .candidates
        .reject(&id, &uid, body.reason.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_promises<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Query(filter): Query<PromiseFilter>,
) -> ApiResult<Response> {
    let snapshot = portal.snapshot().await?;
    Ok(Json(group_promises(&snapshot, &filter)).into_response())
}

async fn create_promise<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Json(input): Json<Map<String, Value>>,
) -> ApiResult<Response> {
    portal.users.require_admin(&uid).await?;
    Ok(created(portal.promises.create(&input).await?))
}

async fn promise_categories<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
) -> ApiResult<Json<Vec<String>>> {
    let promises = portal.promises.list_all().await?;
    Ok(Json(distinct_categories(&promises)))
}

async fn get_promise<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    Ok(Json(portal.promises.require(&id).await?).into_response())
}

async fn update_promise<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    portal.users.require_admin(&uid).await?;
    Ok(outcome(portal.promises.update(&id, &input).await?))
}

async fn delete_promise<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    portal.users.require_admin(&uid).await?;
    portal.promises.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_feedback<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Query(filter): Query<FeedbackFilter>,
) -> ApiResult<Response> {
    let snapshot = portal.snapshot().await?;
    Ok(Json(group_feedback(&snapshot, &filter)).into_response())
}

async fn create_feedback<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Json(input): Json<Map<String, Value>>,
) -> ApiResult<Response> {
    Ok(created(portal.submit_feedback(&uid, input).await?))
}

async fn get_feedback<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    Ok(Json(portal.feedback.require(&id).await?).into_response())
}

/// Authors may edit their own feedback; anyone else needs the admin role.
async fn require_author_or_admin<S: DocumentStore, O: ObjectStore>(
    portal: &Portal<S, O>,
    feedback_id: &str,
    uid: &str,
) -> ApiResult<()> {
    let entry = portal.feedback.require(feedback_id).await?;
    if entry.user_id != uid {
        portal.users.require_admin(uid).await?;
    }
    Ok(())
}

async fn update_feedback<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    require_author_or_admin(&portal, &id, &uid).await?;
    Ok(outcome(portal.feedback.update(&id, &input).await?))
}

async fn delete_feedback<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require_author_or_admin(&portal, &id, &uid).await?;
    portal.feedback.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_reports<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Query(filter): Query<ReportFilter>,
) -> ApiResult<Json<Vec<Report>>> {
    let snapshot = portal.snapshot().await?;
    let reports = filter_reports(&snapshot, &filter)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(reports))
}

async fn create_report<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Json(mut input): Json<Map<String, Value>>,
) -> ApiResult<Response> {
    portal.users.require_admin(&uid).await?;
    if let Some(candidate_id) = input.get("candidateId").and_then(Value::as_str) {
        if !candidate_id.trim().is_empty() {
            portal.candidates.require(candidate_id).await?;
        }
    }
    input.insert("uploadedBy".to_string(), Value::String(uid));
    Ok(created(portal.reports.create(&input).await?))
}

async fn report_stats<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
) -> ApiResult<Response> {
    Ok(Json(portal.report_stats().await?).into_response())
}

async fn report_types<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
) -> ApiResult<Response> {
    let reports = portal.reports.list_all().await?;
    Ok(Json(distinct_report_types(&reports)).into_response())
}

async fn list_unverified_reports<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
) -> ApiResult<Json<Vec<Report>>> {
    portal.users.require_admin(&uid).await?;
    Ok(Json(portal.reports.list_unverified().await?))
}

async fn get_report<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Path(id): Path<String>,
) -> ApiResult<Json<Report>> {
    Ok(Json(portal.reports.require(&id).await?))
}

async fn update_report<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    portal.users.require_admin(&uid).await?;
    Ok(outcome(portal.reports.update(&id, &input).await?))
}

async fn delete_report<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    portal.users.require_admin(&uid).await?;
    portal.reports.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn verify_report<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
    body: Option<Json<ReviewBody>>,
) -> ApiResult<StatusCode> {
    portal.users.require_admin(&uid).await?;
    let body = body.map(|Json(body)| body).unwrap_or_default();
    portal.reports.verify(&id, &uid, body.notes.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reject_report<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Path(id): Path<String>,
    body: Option<Json<ReviewBody>>,
) -> ApiResult<StatusCode> {
    portal.users.require_admin(&uid).await?;
    let body = body.map(|Json(body)| body).unwrap_or_default();
    portal.reports.reject(&id, &uid, body.reason.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
) -> ApiResult<Response> {
    portal.users.require_admin(&uid).await?;
    Ok(Json(portal.users.list_all().await?).into_response())
}

/// Record the profile of a freshly signed-up account. Self-registration always lands
/// in the `user` role.
async fn register_user<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Json(mut input): Json<Map<String, Value>>,
) -> ApiResult<Response> {
    input.remove("role");
    portal.users.create(&uid, &input).await?;
    Ok(created(uid))
}

async fn current_user<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
) -> ApiResult<Response> {
    let profile = portal
        .users
        .get_by_id(&uid)
        .await?
        .ok_or_else(|| AccessError::not_found(Collection::Users, uid))?;
    Ok(Json(profile).into_response())
}

/// Users may edit their own name and email; role changes and edits to other
/// profiles need the admin role.
async fn update_user<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(caller): Caller,
    Path(uid): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    if caller != uid || input.contains_key("role") {
        portal.users.require_admin(&caller).await?;
    }
    Ok(outcome(portal.users.update(&uid, &input).await?))
}

async fn list_page_views<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
) -> ApiResult<Response> {
    portal.users.require_admin(&uid).await?;
    Ok(Json(portal.analytics.list_all().await?).into_response())
}

async fn get_page_views<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Path(page): Path<String>,
) -> ApiResult<Response> {
    let views = portal
        .analytics
        .get_page(&page)
        .await?
        .ok_or_else(|| AccessError::not_found(Collection::Analytics, page))?;
    Ok(Json(views).into_response())
}

async fn record_page_view<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Path(page): Path<String>,
) -> ApiResult<StatusCode> {
    portal.analytics.record_page_view(&page).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn candidate_stats<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
) -> ApiResult<Response> {
    Ok(Json(portal.analytics.candidate_stats().await?).into_response())
}

async fn dashboard<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
) -> ApiResult<Response> {
    portal.users.require_admin(&uid).await?;
    Ok(Json(portal.dashboard().await?).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComparePair {
    left: String,
    right: String,
}

async fn compare_candidates<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Query(pair): Query<ComparePair>,
) -> ApiResult<Response> {
    Ok(Json(portal.compare(&pair.left, &pair.right).await?).into_response())
}

async fn compare_candidates_csv<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Query(pair): Query<ComparePair>,
) -> ApiResult<Response> {
    let comparison = portal.compare(&pair.left, &pair.right).await?;
    let csv = comparison.to_csv()?;
    let disposition = format!("attachment; filename=\"{}\"", comparison.file_name());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadParams {
    #[serde(default)]
    file_name: String,
    #[serde(default)]
    folder: Option<String>,
}

async fn upload_candidate_image<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Query(params): Query<UploadParams>,
    bytes: Bytes,
) -> ApiResult<Response> {
    portal.users.require_admin(&uid).await?;
    let url = portal
        .uploads
        .upload_candidate_image(&params.file_name, bytes.to_vec())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "url": url }))).into_response())
}

async fn upload_document<S: DocumentStore, O: ObjectStore>(
    State(portal): Shared<S, O>,
    Caller(uid): Caller,
    Query(params): Query<UploadParams>,
    bytes: Bytes,
) -> ApiResult<Response> {
    portal.users.require_admin(&uid).await?;
    let url = portal
        .uploads
        .upload_document(params.folder.as_deref(), &params.file_name, bytes.to_vec())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "url": url }))).into_response())
}
