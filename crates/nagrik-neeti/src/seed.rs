//! Demo data for local development and walkthroughs.
//!
//! Everything is written through the entity services, so seeded documents pass the same
//! sanitization as administrator input.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::entities::{AccessResult, CandidateService, FeedbackService, PromiseService};
use crate::store::DocumentStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub candidate_ids: Vec<String>,
    pub promises: usize,
    pub feedback: usize,
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}

fn demo_candidates() -> Vec<Value> {
    vec![
        json!({
            "name": "Raj Kumar Singh",
            "party": "National Democratic Alliance",
            "constituency": "Delhi Central",
            "education": "B.Tech from IIT Delhi",
            "transparencyScore": 85,
            "fundsAllocated": 50_000_000,
            "fundsUtilized": 42_500_000,
            "pastPerformance": "Mayor, Municipal Corporation (2015-2020)",
            "politicalHistory": ["Mayor, Municipal Corporation (2015-2020)", "Councilor, South Delhi (2010-2015)"],
            "criminalCases": [],
            "assets": { "total": 12_500_000, "details": ["House worth 5Cr", "Car worth 25L"] },
            "liabilities": { "total": 2_000_000, "details": ["Home loan: 20L"] },
        }),
        json!({
            "name": "Priya Sharma",
            "party": "Indian National Congress",
            "constituency": "Mumbai North",
            "education": "M.A. Economics from Delhi University",
            "transparencyScore": 78,
            "fundsAllocated": 45_000_000,
            "fundsUtilized": 38_250_000,
            "pastPerformance": "State Assembly Member (2014-2019)",
            "politicalHistory": ["State Assembly Member (2014-2019)", "Social Worker (2008-2014)"],
            "criminalCases": [],
            "assets": { "total": 8_500_000, "details": ["Apartment worth 2.5Cr"] },
            "liabilities": { "total": 1_500_000, "details": ["Car loan: 15L"] },
        }),
        json!({
            "name": "Amit Patel",
            "party": "Bharatiya Janata Party",
            "constituency": "Bangalore South",
            "education": "MBA from ISB Hyderabad",
            "transparencyScore": 92,
            "fundsAllocated": 55_000_000,
            "fundsUtilized": 52_250_000,
            "pastPerformance": "Business leader and philanthropist",
            "politicalHistory": ["Philanthropist (2010-present)"],
            "criminalCases": [],
            "assets": { "total": 25_000_000, "details": ["Real estate portfolio", "Business shares"] },
            "liabilities": { "total": 5_000_000 },
        }),
        json!({
            "name": "Neha Verma",
            "party": "Aam Aadmi Party",
            "constituency": "Delhi South",
            "education": "B.A. Political Science from Delhi University",
            "transparencyScore": 88,
            "fundsAllocated": 40_000_000,
            "fundsUtilized": 36_000_000,
            "pastPerformance": "Activist and NGO founder",
            "politicalHistory": ["Activist", "NGO Founder"],
            "criminalCases": [],
            "assets": { "total": 4_500_000 },
            "liabilities": { "total": 1_000_000 },
        }),
        json!({
            "name": "Vikram Desai",
            "party": "All India Majlis-e-Ittehadul Muslimeen",
            "constituency": "Hyderabad",
            "education": "Law degree from Osmania University",
            "transparencyScore": 72,
            "fundsAllocated": 35_000_000,
            "fundsUtilized": 28_000_000,
            "pastPerformance": "Lawyer (2005-2020)",
            "politicalHistory": ["Lawyer (2005-2020)"],
            "criminalCases": ["Case dismissed 2015"],
            "assets": { "total": 6_500_000 },
            "liabilities": { "total": 2_500_000 },
        }),
    ]
}

/// `(candidate index, promise)` pairs.
fn demo_promises() -> Vec<(usize, Value)> {
    vec![
        (0, json!({
            "title": "Build 100 new schools in rural areas",
            "description": "Construct modern schools with quality infrastructure in 5 rural districts",
            "category": "education",
            "status": "in-progress",
            "completionPercentage": 65,
            "completionDate": "2026-06-30",
            "proofLinks": ["https://example.com/school-1", "https://example.com/school-2"],
        })),
        (0, json!({
            "title": "Reduce pollution by 40%",
            "description": "Implement electric public transport and green initiatives",
            "category": "environment",
            "status": "planned",
            "completionPercentage": 0,
            "completionDate": "2027-12-31",
            "proofLinks": [],
        })),
        (1, json!({
            "title": "Create 10,000 new jobs",
            "description": "Support startups and small businesses through funding and mentorship",
            "category": "employment",
            "status": "in-progress",
            "completionPercentage": 55,
            "completionDate": "2026-09-30",
            "proofLinks": ["https://example.com/jobs-report"],
        })),
        (1, json!({
            "title": "Improve healthcare access in villages",
            "description": "Set up 50 health clinics in remote areas",
            "category": "healthcare",
            "status": "completed",
            "completionPercentage": 100,
            "completionDate": "2025-12-15",
            "proofLinks": ["https://example.com/health-clinics"],
        })),
        (2, json!({
            "title": "Build 5 highways",
            "description": "Connect major cities with modern infrastructure",
            "category": "infrastructure",
            "status": "in-progress",
            "completionPercentage": 72,
            "completionDate": "2026-08-30",
            "proofLinks": ["https://example.com/highways"],
        })),
        (3, json!({
            "title": "Support farmers with subsidy",
            "description": "Provide direct cash support and modern farming techniques",
            "category": "agriculture",
            "status": "planned",
            "completionPercentage": 20,
            "completionDate": "2027-03-30",
            "proofLinks": [],
        })),
    ]
}

fn demo_feedback() -> Vec<(usize, Value)> {
    vec![
        (0, json!({
            "userId": "demo-user-1",
            "userName": "Rahul K.",
            "feedbackText": "Great work on education initiatives. More transparency needed in fund allocation.",
            "rating": 4,
            "isPositive": true,
        })),
        (0, json!({
            "userId": "demo-user-2",
            "userName": "Anjali M.",
            "feedbackText": "Mixed results. Some promises delivered, others pending for too long.",
            "rating": 3,
            "isPositive": false,
        })),
        (1, json!({
            "userId": "demo-user-3",
            "userName": "Suresh R.",
            "feedbackText": "Excellent healthcare initiative. Directly benefited from the new health clinic.",
            "rating": 5,
            "isPositive": true,
        })),
        (2, json!({
            "userId": "demo-user-4",
            "userName": "Priya S.",
            "feedbackText": "Infrastructure projects are impressive but delayed in some areas.",
            "rating": 4,
            "isPositive": true,
        })),
        (3, json!({
            "userId": "demo-user-5",
            "userName": "Mohan L.",
            "feedbackText": "Strong focus on social welfare. Highly transparent and accessible.",
            "rating": 5,
            "isPositive": true,
        })),
    ]
}

/// Write the demo candidates, their promises and citizen feedback. Promise counters on
/// each candidate are derived from the seeded promises.
pub async fn load_demo_data<S: DocumentStore>(store: Arc<S>) -> AccessResult<SeedSummary> {
    let candidates = CandidateService::new(Arc::clone(&store));
    let promises = PromiseService::new(Arc::clone(&store));
    let feedback = FeedbackService::new(store);

    let mut candidate_ids = Vec::new();
    for candidate in demo_candidates() {
        candidate_ids.push(candidates.create(&object(candidate)).await?);
    }

    let mut counters = vec![(0u64, 0u64); candidate_ids.len()];
    let seeded_promises = demo_promises();
    for (index, promise) in &seeded_promises {
        let mut fields = object(promise.clone());
        fields.insert("candidateId".to_string(), json!(candidate_ids[*index]));
        promises.create(&fields).await?;

        counters[*index].0 += 1;
        if promise.get("status").and_then(Value::as_str) == Some("completed") {
            counters[*index].1 += 1;
        }
    }
    for (id, (total, completed)) in candidate_ids.iter().zip(&counters) {
        let patch = object(json!({ "promisesTotal": total, "promisesCompleted": completed }));
        candidates.update(id, &patch).await?;
    }

    let seeded_feedback = demo_feedback();
    for (index, entry) in &seeded_feedback {
        let mut fields = object(entry.clone());
        fields.insert("candidateId".to_string(), json!(candidate_ids[*index]));
        feedback.create(&fields).await?;
    }

    info!(
        candidates = candidate_ids.len(),
        promises = seeded_promises.len(),
        feedback = seeded_feedback.len(),
        "demo data loaded"
    );
    Ok(SeedSummary {
        candidate_ids,
        promises: seeded_promises.len(),
        feedback: seeded_feedback.len(),
    })
}
