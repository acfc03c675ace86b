use super::common::*;
use serde_json::json;
use std::sync::Arc;

use crate::entities::{
    CandidateService, FeedbackService, PromiseService, ReportService, UserService, WriteOutcome,
};
use crate::store::{Collection, Document, DocumentStore, InMemoryDocumentStore};

async fn snapshot(store: &InMemoryDocumentStore, collection: Collection, id: &str) -> Document {
    store
        .get(collection, id)
        .await
        .expect("store reachable")
        .expect("document exists")
}

#[tokio::test]
async fn empty_or_invalid_patches_leave_every_collection_untouched() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let candidates = CandidateService::new(Arc::clone(&store));
    let promises = PromiseService::new(Arc::clone(&store));
    let feedback = FeedbackService::new(Arc::clone(&store));
    let reports = ReportService::new(Arc::clone(&store));
    let users = UserService::new(Arc::clone(&store));

    let candidate_id = candidates
        .create(&candidate_input("Asha", "Jan Morcha", "Pune East"))
        .await
        .expect("candidate");
    let promise_id = promises
        .create(&input(json!({ "candidateId": candidate_id, "title": "Ward library" })))
        .await
        .expect("promise");
    let feedback_id = feedback
        .create(&feedback_input(&candidate_id, json!(4), json!(true)))
        .await
        .expect("feedback");
    let report_id = reports
        .create(&input(json!({ "candidateId": candidate_id, "source": "Affidavit" })))
        .await
        .expect("report");
    users
        .create(CITIZEN_UID, &input(json!({ "name": "Kabir" })))
        .await
        .expect("user");

    let targets = [
        (Collection::Candidates, candidate_id.clone()),
        (Collection::Promises, promise_id.clone()),
        (Collection::Feedback, feedback_id.clone()),
        (Collection::Reports, report_id.clone()),
        (Collection::Users, CITIZEN_UID.to_string()),
    ];
    let mut before = Vec::new();
    for (collection, id) in &targets {
        before.push(snapshot(&store, *collection, id).await);
    }

    let empty = input(json!({}));
    let junk = input(json!({ "age": 5, "createdAt": "yesterday", "verified": true }));
    for patch in [&empty, &junk] {
        assert_eq!(
            candidates.update(&candidate_id, patch).await.expect("candidate"),
            WriteOutcome::Skipped
        );
        assert_eq!(
            promises.update(&promise_id, &empty).await.expect("promise"),
            WriteOutcome::Skipped
        );
        assert_eq!(
            feedback.update(&feedback_id, &empty).await.expect("feedback"),
            WriteOutcome::Skipped
        );
        assert_eq!(
            reports.update(&report_id, &empty).await.expect("report"),
            WriteOutcome::Skipped
        );
        assert_eq!(
            users.update(CITIZEN_UID, &empty).await.expect("user"),
            WriteOutcome::Skipped
        );
    }

    for ((collection, id), previous) in targets.iter().zip(before) {
        assert_eq!(snapshot(&store, *collection, id).await, previous);
    }
}

#[tokio::test]
async fn blank_ids_are_skipped_without_touching_the_store() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let candidates = CandidateService::new(Arc::clone(&store));

    let outcome = candidates
        .update("  ", &input(json!({ "party": "X" })))
        .await
        .expect("skipped");
    assert_eq!(outcome, WriteOutcome::Skipped);
    assert_eq!(store.len(Collection::Candidates), 0);
}
