/// Router tests that never reach the database
///
/// Authentication, request validation and webhook signature checks all
/// answer before any query runs, so these use a lazy pool that points at a
/// closed port.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use clearlaunch_api::clients::stripe::WebhookVerifier;
use clearlaunch_shared::auth::jwt::issue_token_pair;
use common::{bearer, offline_router, send, JWT_SECRET};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let (app, _) = offline_router();

    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _) = offline_router();

    for (method, uri) in [
        ("GET", "/v1/launches"),
        ("GET", "/v1/usage"),
        ("GET", "/v1/profile"),
        ("GET", "/v1/calendar.ics"),
        ("POST", "/v1/billing/checkout"),
    ] {
        let (status, body) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["error"], "Authentication required");
    }
}

#[tokio::test]
async fn test_malformed_and_invalid_tokens() {
    let (app, _) = offline_router();

    let (status, body) = send(&app, "GET", "/v1/launches", Some("Basic abc"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Expected Bearer token");

    let (status, _) = send(&app, "GET", "/v1/launches", Some("Bearer not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = issue_token_pair(Uuid::new_v4(), "another-secret-that-is-32-bytes-long!!").unwrap();
    let (status, _) = send(
        &app,
        "GET",
        "/v1/launches",
        Some(&format!("Bearer {}", foreign.access_token)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let (app, _) = offline_router();
    let tokens = issue_token_pair(Uuid::new_v4(), JWT_SECRET).unwrap();

    let (status, _) = send(
        &app,
        "POST",
        "/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": tokens.access_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": tokens.refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
}

#[tokio::test]
async fn test_register_validation() {
    let (app, _) = offline_router();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "launch-2024" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "email");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({ "email": "ada@example.com", "password": "no-digits-here" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "password");
}

#[tokio::test]
async fn test_launch_request_validation() {
    let (app, _) = offline_router();
    let auth = bearer(Uuid::new_v4());

    let (status, body) = send(
        &app,
        "POST",
        "/v1/launches",
        Some(&auth),
        Some(json!({
            "name": "Summer Serum",
            "launch_start": "2024-06-15",
            "launch_end": "2024-06-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "launch_end");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/launches",
        Some(&auth),
        Some(json!({ "name": "Summer Serum", "template_id": "mystery-launch" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "template_id");

    let (status, _) = send(&app, "POST", "/v1/launches", Some(&auth), Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", "/v1/launches", Some(&auth), Some(json!({ "name": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "name");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/v1/launches/{}", Uuid::new_v4()),
        Some(&auth),
        Some(json!({ "name": " \t " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "name");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/launches/{}/tasks", Uuid::new_v4()),
        Some(&auth),
        Some(json!({ "title": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "title");

    let (status, _) = send(&app, "GET", "/v1/launches?status=deleted", Some(&auth), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_task_status_validation() {
    let (app, _) = offline_router();
    let auth = bearer(Uuid::new_v4());

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/v1/tasks/{}", Uuid::new_v4()),
        Some(&auth),
        Some(json!({ "status": "done" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "status");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/v1/tasks/{}", Uuid::new_v4()),
        Some(&auth),
        Some(json!({ "clear": ["title"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "clear");
}

#[tokio::test]
async fn test_checkout_rejects_free_plan() {
    let (app, stubs) = offline_router();
    let auth = bearer(Uuid::new_v4());

    let (status, body) = send(
        &app,
        "POST",
        "/v1/billing/checkout",
        Some(&auth),
        Some(json!({ "plan": "free" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "plan");
    assert_eq!(
        stubs.payments.customers_created.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

#[tokio::test]
async fn test_webhook_requires_valid_signature() {
    let (app, _) = offline_router();
    let payload = json!({
        "id": "evt_1",
        "type": "customer.subscription.deleted",
        "data": { "object": { "customer": "cus_test" } }
    });

    let (status, body) = send(&app, "POST", "/v1/billing/webhook", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing Stripe-Signature header");

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/billing/webhook")
        .header("stripe-signature", format!("t={},v1=deadbeef", Utc::now().timestamp()))
        .body(axum::body::Body::from(payload.to_string()))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Correctly signed with the wrong secret
    let other = WebhookVerifier::new("whsec_other");
    let now = Utc::now().timestamp();
    let signature = other.sign(now, payload.to_string().as_bytes()).unwrap();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/billing/webhook")
        .header("stripe-signature", format!("t={},v1={}", now, signature))
        .body(axum::body::Body::from(payload.to_string()))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
