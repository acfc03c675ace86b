//! Listing filters for the public pages.
//!
//! Handlers load a [`CatalogSnapshot`] once per request and pass it to these pure
//! functions instead of keeping cached lists around between calls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{self, FeedbackSummary};
use crate::entities::{Candidate, ElectionPromise, Feedback, PromiseStatus, Report, ReportKind};

pub const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";
const UNKNOWN_GROUP: &str = "unknown";

/// Every record a listing page works from, fetched at one refresh point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub candidates: Vec<Candidate>,
    pub promises: Vec<ElectionPromise>,
    pub feedback: Vec<Feedback>,
    pub reports: Vec<Report>,
}

impl CatalogSnapshot {
    pub fn candidate(&self, id: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| candidate.id == id)
    }
}

/// Lookup facts shown in every group header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateHeading {
    pub candidate_id: String,
    pub candidate_name: String,
    pub party: String,
    pub fulfillment: i64,
}

impl CandidateHeading {
    fn lookup(snapshot: &CatalogSnapshot, candidate_id: &str) -> Self {
        match snapshot.candidate(candidate_id) {
            Some(candidate) => Self {
                candidate_id: candidate_id.to_string(),
                candidate_name: candidate.display_name().to_string(),
                party: candidate.party_or_independent().to_string(),
                fulfillment: candidate.fulfillment_percentage(),
            },
            None => Self {
                candidate_id: candidate_id.to_string(),
                candidate_name: UNKNOWN_CANDIDATE.to_string(),
                party: "Independent".to_string(),
                fulfillment: 0,
            },
        }
    }
}

/// Group items by candidate id, keeping groups in first-seen order.
fn group_by_candidate<'a, T>(
    items: impl IntoIterator<Item = &'a T>,
    candidate_of: impl Fn(&T) -> &str,
) -> Vec<(String, Vec<T>)>
where
    T: Clone + 'a,
{
    let mut groups: Vec<(String, Vec<T>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in items {
        let key = match candidate_of(item) {
            "" => UNKNOWN_GROUP.to_string(),
            id => id.to_string(),
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(item.clone());
    }
    groups
}

fn contains_folded(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .unwrap_or("")
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CandidateSearch {
    pub name: String,
    pub party: String,
    pub constituency: String,
}

/// Case-insensitive substring match; every non-empty term must match.
pub fn search_candidates<'a>(candidates: &'a [Candidate], search: &CandidateSearch) -> Vec<&'a Candidate> {
    candidates
        .iter()
        .filter(|candidate| {
            contains_folded(candidate.name.as_deref(), &search.name)
                && contains_folded(candidate.party.as_deref(), &search.party)
                && contains_folded(candidate.constituency.as_deref(), &search.constituency)
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromiseFilter {
    pub status: Option<PromiseStatus>,
    pub category: Option<String>,
}

impl PromiseFilter {
    fn accepts(&self, promise: &ElectionPromise) -> bool {
        let status_match = self.status.map_or(true, |status| promise.status == status);
        let category_match = match self.category.as_deref() {
            None | Some("") => true,
            Some(category) => promise.category == category,
        };
        status_match && category_match
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromiseGroup {
    #[serde(flatten)]
    pub heading: CandidateHeading,
    pub promises: Vec<ElectionPromise>,
}

pub fn group_promises(snapshot: &CatalogSnapshot, filter: &PromiseFilter) -> Vec<PromiseGroup> {
    let matching = snapshot.promises.iter().filter(|promise| filter.accepts(promise));
    group_by_candidate(matching, |promise| promise.candidate_id.as_str())
        .into_iter()
        .map(|(candidate_id, promises)| PromiseGroup {
            heading: CandidateHeading::lookup(snapshot, &candidate_id),
            promises,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedbackFilter {
    pub candidate_id: Option<String>,
    pub min_rating: Option<u8>,
}

impl FeedbackFilter {
    fn accepts(&self, entry: &Feedback) -> bool {
        let candidate_match = match self.candidate_id.as_deref() {
            None | Some("") => true,
            Some(candidate_id) => entry.candidate_id == candidate_id,
        };
        let rating_match = match self.min_rating {
            None | Some(0) => true,
            Some(min) => entry.rating.unwrap_or(0.0) >= f64::from(min),
        };
        candidate_match && rating_match
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackGroup {
    #[serde(flatten)]
    pub heading: CandidateHeading,
    pub summary: FeedbackSummary,
    pub feedback: Vec<Feedback>,
}

pub fn group_feedback(snapshot: &CatalogSnapshot, filter: &FeedbackFilter) -> Vec<FeedbackGroup> {
    let matching = snapshot.feedback.iter().filter(|entry| filter.accepts(entry));
    group_by_candidate(matching, |entry| entry.candidate_id.as_str())
        .into_iter()
        .map(|(candidate_id, feedback)| FeedbackGroup {
            heading: CandidateHeading::lookup(snapshot, &candidate_id),
            summary: aggregate::feedback_summary(&feedback),
            feedback,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verification {
    #[default]
    All,
    Verified,
    Unverified,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportFilter {
    #[serde(rename = "type")]
    pub kind: Option<ReportKind>,
    pub verification: Verification,
    pub search: Option<String>,
}

/// Reports matching the type, verification state, and a search term over the
/// candidate's name, the description, and the source.
pub fn filter_reports<'a>(snapshot: &'a CatalogSnapshot, filter: &ReportFilter) -> Vec<&'a Report> {
    let term = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty());

    snapshot
        .reports
        .iter()
        .filter(|report| filter.kind.map_or(true, |kind| report.kind == kind))
        .filter(|report| match filter.verification {
            Verification::All => true,
            Verification::Verified => report.verified,
            Verification::Unverified => !report.verified,
        })
        .filter(|report| match term {
            None => true,
            Some(term) => {
                let name = snapshot
                    .candidate(&report.candidate_id)
                    .map(Candidate::display_name);
                contains_folded(name, term)
                    || contains_folded(Some(&report.description), term)
                    || contains_folded(Some(&report.source), term)
            }
        })
        .collect()
}

/// Non-empty promise categories in first-seen order.
pub fn distinct_categories(promises: &[ElectionPromise]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for promise in promises {
        if !promise.category.is_empty() && !categories.contains(&promise.category) {
            categories.push(promise.category.clone());
        }
    }
    categories
}

pub fn distinct_report_types(reports: &[Report]) -> Vec<ReportKind> {
    let mut kinds = Vec::new();
    for report in reports {
        if !kinds.contains(&report.kind) {
            kinds.push(report.kind);
        }
    }
    kinds
}
