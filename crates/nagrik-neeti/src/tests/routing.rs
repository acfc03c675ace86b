use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::portal::Portal;
use crate::router::{portal_router, USER_HEADER};
use crate::storage::InMemoryObjectStore;

fn json_request(method: &str, uri: &str, uid: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(uid) = uid {
        builder = builder.header(USER_HEADER, uid);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str, uid: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(uid) = uid {
        builder = builder.header(USER_HEADER, uid);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn candidate_creation_requires_an_admin() {
    let (_store, portal) = staffed_portal().await;
    let router = portal_router(portal);
    let payload = json!({ "name": "Asha", "party": "Jan Morcha" });

    let anonymous = router
        .clone()
        .oneshot(json_request("POST", "/api/v1/candidates", None, payload.clone()))
        .await
        .expect("route executes");
    assert_eq!(anonymous.status(), StatusCode::FORBIDDEN);

    let citizen = router
        .clone()
        .oneshot(json_request("POST", "/api/v1/candidates", Some(CITIZEN_UID), payload.clone()))
        .await
        .expect("route executes");
    assert_eq!(citizen.status(), StatusCode::FORBIDDEN);

    let admin = router
        .clone()
        .oneshot(json_request("POST", "/api/v1/candidates", Some(ADMIN_UID), payload))
        .await
        .expect("route executes");
    assert_eq!(admin.status(), StatusCode::CREATED);
    let created = read_json_body(admin).await;
    let id = created["id"].as_str().expect("id returned").to_string();

    let fetched = router
        .oneshot(get(&format!("/api/v1/candidates/{id}"), None))
        .await
        .expect("route executes");
    assert_eq!(fetched.status(), StatusCode::OK);
    let body = read_json_body(fetched).await;
    assert_eq!(body["name"], "Asha");
    assert_eq!(body["verified"], false);
}

#[tokio::test]
async fn search_filters_candidates_case_insensitively() {
    let (_store, portal) = memory_portal();
    for (name, party) in [("Asha Verma", "Jan Morcha"), ("Ravi Kumar", "Lok Dal")] {
        portal
            .candidates
            .create(&candidate_input(name, party, "Pune East"))
            .await
            .expect("candidate");
    }

    let response = portal_router(portal)
        .oneshot(get("/api/v1/candidates?party=lok", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let names: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|candidate| candidate["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Ravi Kumar"]);
}

#[tokio::test]
async fn invalid_feedback_maps_to_bad_request() {
    let (_store, portal) = staffed_portal().await;
    let candidate_id = portal
        .candidates
        .create(&candidate_input("Asha", "Jan Morcha", "Pune East"))
        .await
        .expect("candidate");

    let response = portal_router(portal)
        .oneshot(json_request(
            "POST",
            "/api/v1/feedback",
            Some(CITIZEN_UID),
            json!({ "candidateId": candidate_id, "feedbackText": "   ", "rating": 4 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "feedbackText cannot be empty");
}

#[tokio::test]
async fn feedback_edits_are_limited_to_the_author() {
    let (_store, portal) = staffed_portal().await;
    portal
        .users
        .create("citizen-2", &input(json!({ "name": "Zoya" })))
        .await
        .expect("second citizen");
    let candidate_id = portal
        .candidates
        .create(&candidate_input("Asha", "Jan Morcha", "Pune East"))
        .await
        .expect("candidate");
    let feedback_id = portal
        .feedback
        .create(&feedback_input(&candidate_id, json!(4), Value::Null))
        .await
        .expect("feedback");
    let router = portal_router(Arc::clone(&portal));
    let uri = format!("/api/v1/feedback/{feedback_id}");

    let stranger = router
        .clone()
        .oneshot(json_request("PATCH", &uri, Some("citizen-2"), json!({ "rating": 1 })))
        .await
        .expect("route executes");
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);

    let author = router
        .oneshot(json_request("PATCH", &uri, Some(CITIZEN_UID), json!({ "rating": 2 })))
        .await
        .expect("route executes");
    assert_eq!(author.status(), StatusCode::OK);
    assert_eq!(read_json_body(author).await["outcome"], "applied");

    let stored = portal.feedback.require(&feedback_id).await.expect("readable");
    assert_eq!(stored.rating, Some(2.0));
}

#[tokio::test]
async fn unknown_candidates_are_not_found() {
    let (_store, portal) = memory_portal();

    let response = portal_router(portal)
        .oneshot(get("/api/v1/candidates/candidates-404/scorecard", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn backend_outage_maps_to_bad_gateway() {
    let objects = Arc::new(InMemoryObjectStore::new("bucket"));
    let portal = Arc::new(Portal::new(Arc::new(FailingStore), objects));

    let response = portal_router(portal)
        .oneshot(get("/api/v1/candidates", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn comparison_csv_is_served_as_attachment() {
    let (_store, portal) = memory_portal();
    let left = portal
        .candidates
        .create(&candidate_input("Asha", "Jan Morcha", "Pune East"))
        .await
        .expect("candidate");
    let right = portal
        .candidates
        .create(&candidate_input("Ravi", "Lok Dal", "Pune West"))
        .await
        .expect("candidate");

    let response = portal_router(portal)
        .oneshot(get(
            &format!("/api/v1/compare/csv?left={left}&right={right}"),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .expect("disposition header")
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"comparison_Asha_vs_Ravi.csv\"");

    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let csv = String::from_utf8(body.to_vec()).expect("utf-8");
    assert_eq!(csv.lines().count(), 11);
}

#[tokio::test]
async fn self_registration_cannot_claim_admin() {
    let (_store, portal) = memory_portal();
    let router = portal_router(Arc::clone(&portal));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/users",
            Some("new-user"),
            json!({ "name": "Dev", "email": "dev@example.org", "role": "admin" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let me = router
        .oneshot(get("/api/v1/users/me", Some("new-user")))
        .await
        .expect("route executes");
    let body = read_json_body(me).await;
    assert_eq!(body["role"], "user");
    assert_eq!(body["uid"], "new-user");
}

#[tokio::test]
async fn uploads_return_download_urls() {
    let (_store, portal) = staffed_portal().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/uploads/candidate-images?fileName=asha.jpg")
        .header(USER_HEADER, ADMIN_UID)
        .body(Body::from(vec![0xff, 0xd8, 0xff]))
        .unwrap();
    let response = portal_router(portal)
        .oneshot(request)
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    let url = body["url"].as_str().expect("url");
    assert!(url.starts_with("memory://nagrik-neeti-test.appspot.com/candidates/"));
    assert!(url.ends_with("_asha.jpg"));
}
