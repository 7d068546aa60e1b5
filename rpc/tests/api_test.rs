//! Router tests: requests go through the full axum stack via `oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use vetting_nullables::{NullClock, NullVerificationStore};
use vetting_rpc::{router, AppState, BroadcastSink, RpcMetrics};
use vetting_types::VerificationStatus;
use vetting_verification::VerificationService;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct TestApp {
    app: Router,
    sink: Arc<BroadcastSink>,
}

fn test_app() -> TestApp {
    let store = Arc::new(NullVerificationStore::new());
    let clock = Arc::new(NullClock::new(1_000));
    let sink = Arc::new(BroadcastSink::new(16));
    let service = VerificationService::new(store, clock).with_sink(sink.clone());
    let metrics = Arc::new(RpcMetrics::new().expect("metrics"));
    let state = AppState::new(Arc::new(service)).with_metrics(metrics);
    TestApp {
        app: router(state),
        sink,
    }
}

fn request(method: &str, uri: &str, who: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = who {
        builder = builder.header("x-user-id", id).header("x-user-role", role);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1 << 20).await.expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

fn founder_documents() -> Value {
    json!({
        "documents": {
            "idDocument": "s3://docs/id.pdf",
            "proofOfAddress": "s3://docs/bill.pdf",
            "businessRegistration": "s3://docs/reg.pdf"
        }
    })
}

const ADMIN: Option<(&str, &str)> = Some(("admin-1", "admin"));

// ---------------------------------------------------------------------------
// Submission and status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_then_status() {
    let TestApp { app, .. } = test_app();
    let founder = Some(("f-1", "founder"));

    let (status, body) = send(
        &app,
        request("POST", "/api/verification/submit", founder, Some(founder_documents())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["userId"], "f-1");
    assert_eq!(body["role"], "founder");
    assert_eq!(body["documents"].as_array().unwrap().len(), 3);

    let (status, body) = send(&app, request("GET", "/api/verification/status", founder, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["isVerified"], false);
    assert_eq!(body["submittedAt"], 1_000);
}

#[tokio::test]
async fn founder_missing_registration_is_unprocessable() {
    let TestApp { app, .. } = test_app();
    let body = json!({
        "documents": {
            "idDocument": "s3://docs/id.pdf",
            "proofOfAddress": "s3://docs/bill.pdf"
        }
    });

    let (status, err) = send(
        &app,
        request("POST", "/api/verification/submit", Some(("f-1", "founder")), Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "missing_required_document");

    let (status, _) = send(
        &app,
        request("POST", "/api/verification/submit", Some(("i-1", "investor")), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn duplicate_submission_conflicts() {
    let TestApp { app, .. } = test_app();
    let founder = Some(("f-1", "founder"));
    send(&app, request("POST", "/api/verification/submit", founder, Some(founder_documents()))).await;

    let (status, err) = send(
        &app,
        request("POST", "/api/verification/submit", founder, Some(founder_documents())),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "outstanding_request_exists");
}

#[tokio::test]
async fn unknown_user_status_is_none() {
    let TestApp { app, .. } = test_app();
    let (status, body) = send(&app, request("GET", "/api/verification/status/newbie", ADMIN, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "none", "isVerified": false}));
}

#[tokio::test]
async fn missing_identity_is_unauthenticated() {
    let TestApp { app, .. } = test_app();
    let (status, err) = send(&app, request("GET", "/api/verification/status", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"]["code"], "unauthenticated");
}

#[tokio::test]
async fn users_cannot_read_each_others_status() {
    let TestApp { app, .. } = test_app();
    let (status, err) = send(
        &app,
        request("GET", "/api/verification/status/f-1", Some(("i-1", "investor")), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn malformed_body_uses_error_envelope() {
    let TestApp { app, .. } = test_app();
    let (status, err) = send(
        &app,
        request(
            "POST",
            "/api/verification/submit",
            Some(("f-1", "founder")),
            Some(json!({"documents": {"selfie": "s3://x"}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "invalid_request");
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

#[tokio::test]
async fn review_flow_and_resubmission() {
    let TestApp { app, sink } = test_app();
    let mut events = sink.subscribe();
    let founder = Some(("f-1", "founder"));

    let (_, created) =
        send(&app, request("POST", "/api/verification/submit", founder, Some(founder_documents()))).await;
    let id = created["id"].as_u64().unwrap();
    let review_uri = format!("/api/verification/requests/{id}/review");

    // Non-admin cannot review.
    let (status, _) = send(
        &app,
        request("POST", &review_uri, founder, Some(json!({"decision": "approve"}))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Rejection needs a reason.
    let (status, err) = send(
        &app,
        request("POST", &review_uri, ADMIN, Some(json!({"decision": "reject", "reason": "  "}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "reason_required");

    let (status, body) = send(
        &app,
        request(
            "POST",
            &review_uri,
            ADMIN,
            Some(json!({"decision": "reject", "reason": "registration expired"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejectionReason"], "registration expired");
    assert_eq!(body["reviewedBy"], "admin-1");

    let event = events.try_recv().expect("review event");
    assert_eq!(event.status, VerificationStatus::Rejected);

    // A second decision loses.
    let (status, err) = send(
        &app,
        request("POST", &review_uri, ADMIN, Some(json!({"decision": "approve"}))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "already_finalized");

    // Re-submission supersedes the rejection.
    send(&app, request("POST", "/api/verification/submit", founder, Some(founder_documents()))).await;
    let (_, snap) = send(&app, request("GET", "/api/verification/status", founder, None)).await;
    assert_eq!(snap["status"], "pending");
    assert!(snap.get("rejectionReason").is_none());

    let (_, history) = send(&app, request("GET", "/api/verification/history/f-1", founder, None)).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn review_of_unknown_request_is_not_found() {
    let TestApp { app, .. } = test_app();
    let (status, err) = send(
        &app,
        request(
            "POST",
            "/api/verification/requests/999/review",
            ADMIN,
            Some(json!({"decision": "approve"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["code"], "not_found");
}

#[tokio::test]
async fn non_numeric_request_id_uses_error_envelope() {
    let TestApp { app, .. } = test_app();

    let (status, err) = send(
        &app,
        request("GET", "/api/verification/requests/abc", ADMIN, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "invalid_request");

    let (status, err) = send(
        &app,
        request(
            "POST",
            "/api/verification/requests/-1/review",
            ADMIN,
            Some(json!({"decision": "approve"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "invalid_request");
}

// ---------------------------------------------------------------------------
// Queue, health, metrics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn queue_is_paginated_and_admin_only() {
    let TestApp { app, .. } = test_app();
    for i in 0..25 {
        let who = format!("i-{i}");
        let body = json!({"documents": {"idDocument": "s3://a", "proofOfAddress": "s3://b"}});
        let (status, _) = send(
            &app,
            request("POST", "/api/verification/submit", Some((who.as_str(), "investor")), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = send(
        &app,
        request("GET", "/api/verification/requests?page=2&limit=10&status=pending", ADMIN, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 10);
    assert_eq!(
        page["pagination"],
        json!({"page": 2, "limit": 10, "totalPages": 3, "total": 25})
    );

    let (status, _) = send(
        &app,
        request("GET", "/api/verification/requests", Some(("i-1", "investor")), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, err) = send(
        &app,
        request("GET", "/api/verification/requests?status=archived", ADMIN, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn health_and_metrics() {
    let TestApp { app, .. } = test_app();
    let (status, body) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    send(&app, request("POST", "/api/verification/submit", Some(("f-1", "founder")), Some(founder_documents()))).await;
    let (status, body) = send(&app, request("GET", "/metrics", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().expect("plain text exposition");
    assert!(text.contains("vetting_submissions_total{outcome=\"accepted\"} 1"));
}

#[tokio::test]
async fn metrics_disabled_is_not_found() {
    let store = Arc::new(NullVerificationStore::new());
    let clock = Arc::new(NullClock::new(0));
    let app = router(AppState::new(Arc::new(VerificationService::new(store, clock))));
    let (status, _) = send(&app, request("GET", "/metrics", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
