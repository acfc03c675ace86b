//! Derived metrics computed from stored records.
//!
//! Nothing here touches the store: services and page handlers fetch the records and
//! pass slices in, which keeps every rule here a pure function of its inputs.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::entities::{Candidate, ElectionPromise, Feedback, Report, ReportKind};

pub const CHART_LIMIT: usize = 8;

/// `round(part / whole * 100)`, or 0 when the whole is missing or not positive.
pub fn percentage(part: Option<f64>, whole: Option<f64>) -> i64 {
    match whole {
        Some(whole) if whole > 0.0 => {
            let part = part.unwrap_or(0.0);
            (part / whole * 100.0).round() as i64
        }
        _ => 0,
    }
}

pub fn fulfillment_percentage(candidate: &Candidate) -> i64 {
    percentage(candidate.promises_completed, candidate.promises_total)
}

pub fn fund_utilization_percentage(candidate: &Candidate) -> i64 {
    percentage(candidate.funds_utilized, candidate.funds_allocated)
}

/// Integer part of a money amount; missing or non-finite amounts count as zero.
fn whole_amount(amount: Option<f64>) -> i64 {
    amount
        .filter(|amount| amount.is_finite())
        .map_or(0, |amount| amount.trunc() as i64)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub total_feedback: usize,
    pub average_rating: f64,
    pub positive_count: usize,
    pub negative_count: usize,
}

/// Mean rating rounded to one decimal; 0 when there is no feedback.
pub fn average_rating(feedback: &[Feedback]) -> f64 {
    if feedback.is_empty() {
        return 0.0;
    }
    let sum: f64 = feedback.iter().map(Feedback::effective_rating).sum();
    (sum / feedback.len() as f64 * 10.0).round() / 10.0
}

pub fn feedback_summary(feedback: &[Feedback]) -> FeedbackSummary {
    FeedbackSummary {
        total_feedback: feedback.len(),
        average_rating: average_rating(feedback),
        positive_count: feedback
            .iter()
            .filter(|entry| entry.is_positive == Some(true))
            .count(),
        negative_count: feedback
            .iter()
            .filter(|entry| entry.is_positive == Some(false))
            .count(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStats {
    pub total_candidates: usize,
    pub verified_count: usize,
    pub party_count: BTreeMap<String, usize>,
}

pub fn candidate_stats(candidates: &[Candidate]) -> CandidateStats {
    let mut stats = CandidateStats {
        total_candidates: candidates.len(),
        ..CandidateStats::default()
    };
    for candidate in candidates {
        if candidate.verified {
            stats.verified_count += 1;
        }
        *stats
            .party_count
            .entry(candidate.party_or_independent().to_string())
            .or_default() += 1;
    }
    stats
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_candidates: usize,
    pub total_promises: usize,
    pub average_fulfillment: i64,
    pub total_funds_allocated: i64,
    pub total_funds_utilized: i64,
}

pub fn dashboard_overview(candidates: &[Candidate], promises: &[ElectionPromise]) -> DashboardOverview {
    let mut overview = DashboardOverview {
        total_candidates: candidates.len(),
        total_promises: promises.len(),
        ..DashboardOverview::default()
    };
    if candidates.is_empty() {
        return overview;
    }

    let fulfillment_sum: i64 = candidates.iter().map(fulfillment_percentage).sum();
    overview.average_fulfillment =
        (fulfillment_sum as f64 / candidates.len() as f64).round() as i64;
    overview.total_funds_allocated = candidates
        .iter()
        .map(|candidate| whole_amount(candidate.funds_allocated))
        .sum();
    overview.total_funds_utilized = candidates
        .iter()
        .map(|candidate| whole_amount(candidate.funds_utilized))
        .sum();
    overview
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub id: String,
    pub name: String,
    pub party: String,
    pub constituency: String,
    pub fulfillment: i64,
}

impl RankedCandidate {
    fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.clone(),
            name: candidate.display_name().to_string(),
            party: candidate.party_or_independent().to_string(),
            constituency: candidate.constituency.clone().unwrap_or_default(),
            fulfillment: fulfillment_percentage(candidate),
        }
    }
}

fn ranked_by_fulfillment<'a>(candidates: impl Iterator<Item = &'a Candidate>) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates.map(RankedCandidate::from_candidate).collect();
    ranked.sort_by_key(|entry| Reverse(entry.fulfillment));
    ranked
}

/// The `limit` best performers by fulfillment; ties keep their input order.
pub fn top_performers(candidates: &[Candidate], limit: usize) -> Vec<RankedCandidate> {
    let mut ranked = ranked_by_fulfillment(candidates.iter());
    ranked.truncate(limit);
    ranked
}

/// Rows for the fulfillment chart: candidates with some progress, best first.
pub fn fulfillment_chart(candidates: &[Candidate]) -> Vec<RankedCandidate> {
    let mut ranked = ranked_by_fulfillment(
        candidates
            .iter()
            .filter(|candidate| fulfillment_percentage(candidate) > 0),
    );
    ranked.truncate(CHART_LIMIT);
    ranked
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FundHealth {
    Good,
    Fair,
    Poor,
}

impl FundHealth {
    pub fn from_utilization(utilization: i64) -> Self {
        if utilization > 80 {
            FundHealth::Good
        } else if utilization > 50 {
            FundHealth::Fair
        } else {
            FundHealth::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRow {
    pub id: String,
    pub name: String,
    pub allocated: i64,
    pub utilized: i64,
    pub utilization: i64,
    pub health: FundHealth,
}

/// Rows for the fund chart: candidates with an allocation, largest allocation first.
pub fn fund_chart(candidates: &[Candidate]) -> Vec<FundRow> {
    let mut rows: Vec<FundRow> = candidates
        .iter()
        .filter_map(|candidate| {
            let allocated = whole_amount(candidate.funds_allocated);
            if allocated <= 0 {
                return None;
            }
            let utilized = whole_amount(candidate.funds_utilized);
            let utilization = percentage(Some(utilized as f64), Some(allocated as f64));
            Some(FundRow {
                id: candidate.id.clone(),
                name: candidate.display_name().to_string(),
                allocated,
                utilized,
                utilization,
                health: FundHealth::from_utilization(utilization),
            })
        })
        .collect();
    rows.sort_by_key(|row| Reverse(row.allocated));
    rows.truncate(CHART_LIMIT);
    rows
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total_candidates: usize,
    pub verified_candidates: usize,
    pub total_reports: usize,
    pub verified_reports: usize,
    pub criminal_reports: usize,
    pub asset_reports: usize,
    pub performance_reports: usize,
}

pub fn report_stats(candidates: &[Candidate], reports: &[Report]) -> ReportStats {
    let of_kind = |kind: ReportKind| reports.iter().filter(|report| report.kind == kind).count();
    ReportStats {
        total_candidates: candidates.len(),
        verified_candidates: candidates.iter().filter(|candidate| candidate.verified).count(),
        total_reports: reports.len(),
        verified_reports: reports.iter().filter(|report| report.verified).count(),
        criminal_reports: of_kind(ReportKind::Criminal),
        asset_reports: of_kind(ReportKind::Asset),
        performance_reports: of_kind(ReportKind::Performance),
    }
}

/// Everything the candidate profile page shows in one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub candidate: Candidate,
    pub fulfillment_percentage: i64,
    pub fund_utilization_percentage: i64,
    pub feedback: FeedbackSummary,
    pub promises: Vec<ElectionPromise>,
    pub reports: Vec<Report>,
}

impl Scorecard {
    pub fn new(
        candidate: Candidate,
        promises: Vec<ElectionPromise>,
        reports: Vec<Report>,
        feedback: &[Feedback],
    ) -> Self {
        Self {
            fulfillment_percentage: fulfillment_percentage(&candidate),
            fund_utilization_percentage: fund_utilization_percentage(&candidate),
            feedback: feedback_summary(feedback),
            candidate,
            promises,
            reports,
        }
    }
}
