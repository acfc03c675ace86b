use super::common::*;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::aggregate;
use crate::entities::{AccessError, CandidateService, ValidationError, WriteOutcome};
use crate::store::{Collection, DocumentStore, InMemoryDocumentStore, StoreError};

#[tokio::test]
async fn create_nulls_mistyped_fields_instead_of_coercing() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let service = CandidateService::new(Arc::clone(&store));

    let id = service
        .create(&input(json!({ "name": 123, "party": "Lok Dal", "criminalCases": "none" })))
        .await
        .expect("candidate created");

    let document = store
        .get(Collection::Candidates, &id)
        .await
        .expect("store reachable")
        .expect("document stored");
    assert_eq!(document.get("name"), Some(&Value::Null));
    assert_eq!(document.get("criminalCases"), Some(&json!([])));
    assert!(document.get("createdAt").is_some_and(Value::is_string));

    let candidate = service.require(&id).await.expect("candidate readable");
    assert_eq!(candidate.display_name(), "Unknown");
    assert_eq!(candidate.party.as_deref(), Some("Lok Dal"));
}

#[tokio::test]
async fn update_writes_only_declared_well_typed_fields() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let service = CandidateService::new(Arc::clone(&store));
    let id = service
        .create(&candidate_input("Asha Verma", "Jan Morcha", "Pune East"))
        .await
        .expect("candidate created");

    let outcome = service
        .update(&id, &input(json!({ "party": "X", "age": 5 })))
        .await
        .expect("update applied");
    assert_eq!(outcome, WriteOutcome::Applied);

    let document = store
        .get(Collection::Candidates, &id)
        .await
        .expect("store reachable")
        .expect("document stored");
    assert_eq!(document.get("party"), Some(&json!("X")));
    assert!(document.get("age").is_none());
    assert!(document.get("updatedAt").is_some());
    assert_eq!(document.get("name"), Some(&json!("Asha Verma")));
}

#[tokio::test]
async fn completed_promises_cannot_exceed_total_in_one_payload() {
    let service = CandidateService::new(Arc::new(InMemoryDocumentStore::new()));

    let err = service
        .create(&input(json!({ "name": "Asha", "promisesTotal": 3, "promisesCompleted": 5 })))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AccessError::Validation(ValidationError::Exceeds {
            lesser: "promisesCompleted",
            greater: "promisesTotal"
        })
    ));

    let id = service
        .create(&candidate_input("Asha", "Jan Morcha", "Pune East"))
        .await
        .expect("candidate created");
    let err = service
        .update(&id, &input(json!({ "fundsAllocated": 100, "fundsUtilized": 250 })))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Validation(ValidationError::Exceeds { .. })));
}

#[tokio::test]
async fn one_sided_updates_are_checked_against_stored_counterparts() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let service = CandidateService::new(Arc::clone(&store));
    let id = service
        .create(&input(json!({
            "name": "Asha",
            "promisesTotal": 4,
            "promisesCompleted": 2,
            "fundsAllocated": 100,
            "fundsUtilized": 50,
        })))
        .await
        .expect("candidate created");

    let err = service
        .update(&id, &input(json!({ "promisesCompleted": 10 })))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AccessError::Validation(ValidationError::Exceeds {
            lesser: "promisesCompleted",
            greater: "promisesTotal"
        })
    ));
    let err = service
        .update(&id, &input(json!({ "fundsAllocated": 40 })))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AccessError::Validation(ValidationError::Exceeds {
            lesser: "fundsUtilized",
            greater: "fundsAllocated"
        })
    ));

    let candidate = service.require(&id).await.expect("candidate readable");
    assert_eq!(candidate.promises_completed, Some(2.0));
    assert_eq!(candidate.fulfillment_percentage(), 50);
    assert_eq!(candidate.fund_utilization_percentage(), 50);

    let outcome = service
        .update(&id, &input(json!({ "promisesCompleted": 4, "fundsUtilized": 100 })))
        .await
        .expect("within bounds");
    assert_eq!(outcome, WriteOutcome::Applied);
    let candidate = service.require(&id).await.expect("candidate readable");
    assert_eq!(candidate.fulfillment_percentage(), 100);
}

#[tokio::test]
async fn rejecting_a_verified_candidate_clears_the_verification() {
    let service = CandidateService::new(Arc::new(InMemoryDocumentStore::new()));
    let id = service
        .create(&candidate_input("Asha", "Jan Morcha", "Pune East"))
        .await
        .expect("created");

    service.verify(&id, ADMIN_UID, Some("ok")).await.expect("verified");
    service
        .reject(&id, ADMIN_UID, Some("forged affidavit"))
        .await
        .expect("rejected");

    let asha = service.require(&id).await.expect("exists");
    assert!(!asha.verified);
    assert_eq!(asha.verification_notes, None);
    assert_eq!(asha.verified_by, None);
    assert_eq!(asha.verified_at, None);
    assert_eq!(asha.rejection_reason.as_deref(), Some("forged affidavit"));
    let all = service.list_all().await.expect("listing loads");
    assert_eq!(aggregate::candidate_stats(&all).verified_count, 0);

    service.verify(&id, ADMIN_UID, None).await.expect("re-verified");
    let asha = service.require(&id).await.expect("exists");
    assert!(asha.verified);
    assert_eq!(asha.rejection_reason, None);
    assert_eq!(asha.rejected_by, None);
    assert_eq!(asha.rejected_at, None);
}

#[tokio::test]
async fn updating_a_missing_candidate_is_not_found() {
    let service = CandidateService::new(Arc::new(InMemoryDocumentStore::new()));

    let err = service
        .update("candidates-999999", &input(json!({ "party": "X" })))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AccessError::NotFound {
            collection: Collection::Candidates,
            ..
        }
    ));
}

#[tokio::test]
async fn review_queue_excludes_verified_and_rejected_candidates() {
    let service = CandidateService::new(Arc::new(InMemoryDocumentStore::new()));
    let verified = service
        .create(&candidate_input("Asha", "Jan Morcha", "Pune East"))
        .await
        .expect("created");
    let rejected = service
        .create(&candidate_input("Ravi", "Lok Dal", "Pune West"))
        .await
        .expect("created");
    let pending = service
        .create(&candidate_input("Imran", "Independent", "Pune East"))
        .await
        .expect("created");

    service
        .verify(&verified, ADMIN_UID, Some("   "))
        .await
        .expect("verified");
    service
        .reject(&rejected, ADMIN_UID, None)
        .await
        .expect("rejected");

    let queue = service.list_unverified().await.expect("queue loads");
    let ids: Vec<&str> = queue.iter().map(|candidate| candidate.id.as_str()).collect();
    assert_eq!(ids, vec![pending.as_str()]);

    let asha = service.require(&verified).await.expect("exists");
    assert!(asha.verified);
    assert_eq!(asha.verification_notes, None);
    assert_eq!(asha.verified_by.as_deref(), Some(ADMIN_UID));
    assert!(asha.verified_at.is_some());

    let ravi = service.require(&rejected).await.expect("exists");
    assert_eq!(ravi.rejection_reason.as_deref(), Some("Rejected by admin"));
    assert!(!ravi.verified);
}

#[tokio::test]
async fn constituency_listing_is_sorted_and_distinct() {
    let service = CandidateService::new(Arc::new(InMemoryDocumentStore::new()));
    for (name, constituency) in [("A", "Pune West"), ("B", "Pune East"), ("C", "Pune West")] {
        service
            .create(&candidate_input(name, "Lok Dal", constituency))
            .await
            .expect("created");
    }

    let constituencies = service.list_constituencies().await.expect("listing loads");
    assert_eq!(constituencies, vec!["Pune East", "Pune West"]);

    let west = service
        .list_by_constituency("Pune West")
        .await
        .expect("filter loads");
    assert_eq!(west.len(), 2);
    assert!(service
        .list_by_constituency("")
        .await
        .expect("empty filter")
        .is_empty());
}

#[tokio::test]
async fn backend_failures_are_reported_not_swallowed() {
    let service = CandidateService::new(Arc::new(FailingStore));

    let err = service.list_all().await.unwrap_err();
    assert!(matches!(err, AccessError::Backend(StoreError::Unavailable(_))));

    let err = service
        .create(&candidate_input("Asha", "Jan Morcha", "Pune East"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Backend(_)));
}
