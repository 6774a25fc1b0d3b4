/// End-to-end API flows against PostgreSQL
///
/// Require `DATABASE_URL`; every test returns early without it. Providers
/// are stubbed, so no network access is needed.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use clearlaunch_api::clients::stripe::WebhookVerifier;
use clearlaunch_shared::models::user::{Plan, User};
use common::{send, set_ai_calls_used, TestContext, PLAN_COMPLETION, WEBHOOK_SECRET};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn create_launch(ctx: &TestContext) -> Value {
    let (status, body) = ctx
        .post(
            "/v1/launches",
            json!({
                "name": "Summer Serum",
                "launch_type": "product",
                "launch_start": "2024-06-01",
                "launch_end": "2024-06-15",
                "platforms": ["Instagram", "TikTok"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body
}

#[tokio::test]
async fn test_register_login_and_welcome_email() {
    let Some(ctx) = TestContext::new(Plan::Free).await else {
        return;
    };
    let email = format!("ada-{}@example.com", Uuid::new_v4());

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({ "email": email, "password": "launch-2024", "name": "Ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user"]["plan"], "free");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["access_token"].is_string());

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({ "email": email.to_uppercase(), "password": "launch-2024" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "email");

    let (status, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "wrong-password-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "launch-2024" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], email);

    // Welcome email is sent in the background
    for _ in 0..20 {
        if !ctx.stubs.mailer.sent.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    let sent = ctx.stubs.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, email);
    assert!(sent[0].html.contains("Hi Ada,"));
}

#[tokio::test]
async fn test_profile_marks_user_onboarded() {
    let Some(ctx) = TestContext::new(Plan::Free).await else {
        return;
    };

    let (status, body) = ctx.get("/v1/profile").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, body) = send(
        &ctx.app,
        "PUT",
        "/v1/profile",
        Some(&ctx.auth),
        Some(json!({
            "company_name": "Glow Labs",
            "tone_of_voice": "Warm",
            "platforms": ["Instagram", " Instagram ", "Email", ""]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["platforms"], json!(["Instagram", "Email"]));

    let user = User::find_by_id(&ctx.db, ctx.user.id).await.unwrap().unwrap();
    assert!(user.onboarded);
}

#[tokio::test]
async fn test_free_plan_launch_limit_returns_quota_body() {
    let Some(ctx) = TestContext::new(Plan::Free).await else {
        return;
    };

    let launch = create_launch(&ctx).await;
    assert_eq!(launch["status"], "active");
    assert_eq!(launch["platforms"], json!(["Instagram", "TikTok"]));
    assert_eq!(launch["health"]["planCompleteness"], 0);

    let (status, body) = ctx.post("/v1/launches", json!({ "name": "Second" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
    assert_eq!(body["upgradeUrl"], "https://app.clearlaunch.test/pricing");
    assert_eq!(body["current"], 1);
    assert_eq!(body["limit"], 1);

    let (_, usage) = ctx.get("/v1/usage").await;
    assert_eq!(usage["plan"], "free");
    assert_eq!(usage["launchesUsed"], 1);
    assert_eq!(usage["launchCheck"]["allowed"], false);
    assert_eq!(usage["aiCallCheck"]["allowed"], true);
}

#[tokio::test]
async fn test_generate_plan_then_track_progress() {
    let Some(ctx) = TestContext::new(Plan::Pro).await else {
        return;
    };
    let launch = create_launch(&ctx).await;
    let launch_id = launch["id"].as_str().unwrap().to_string();

    ctx.stubs.llm.respond_with(PLAN_COMPLETION);
    let (status, body) = ctx.post(&format!("/v1/launches/{}/plan", launch_id), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0]["title"], "Research the audience");
    assert_eq!(tasks[0]["order"], 1);
    assert_eq!(tasks[2]["title"], "Launch day announcement");
    assert_eq!(tasks[2]["order"], 3);
    assert_eq!(tasks[1]["due_date"], "2024-06-05T12:00:00Z");
    assert_eq!(body["launch"]["total_tasks"], 3);
    assert_eq!(body["launch"]["plan_summary"], "Research first, tease for a week, then drop.");
    assert_eq!(body["launch"]["template_id"], "product-launch");

    let (_, usage) = ctx.get("/v1/usage").await;
    assert_eq!(usage["aiCallsUsed"], 1);

    let first_task = tasks[0]["id"].as_str().unwrap();
    let (status, task) = ctx
        .patch(&format!("/v1/tasks/{}", first_task), json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "completed");

    let (_, detail) = ctx.get(&format!("/v1/launches/{}", launch_id)).await;
    assert_eq!(detail["progress"], 33.0);
    assert_eq!(detail["completed_tasks"], 1);
    assert_eq!(detail["health"]["planCompleteness"], 33);
    assert_eq!(detail["health"]["platformCoverageCount"], 2);

    let (status, _) = ctx.delete(&format!("/v1/tasks/{}", first_task)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = ctx.get(&format!("/v1/launches/{}", launch_id)).await;
    assert_eq!(detail["total_tasks"], 2);
    assert_eq!(detail["progress"], 0.0);
    let (status, detail) = ctx
        .post(&format!("/v1/launches/{}/resync", launch_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["total_tasks"], 2);
    assert_eq!(detail["completed_tasks"], 0);
}

#[tokio::test]
async fn test_ai_limit_blocks_provider_call() {
    let Some(ctx) = TestContext::new(Plan::Free).await else {
        return;
    };
    let launch = create_launch(&ctx).await;
    set_ai_calls_used(&ctx.db, ctx.user.id, 5).await;

    let (status, body) = ctx
        .post(&format!("/v1/launches/{}/plan", launch["id"].as_str().unwrap()), json!({}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
    assert_eq!(body["limit"], 5);
    assert_eq!(ctx.stubs.llm.calls(), 0);
}

#[tokio::test]
async fn test_provider_failure_is_not_counted() {
    let Some(ctx) = TestContext::new(Plan::Free).await else {
        return;
    };
    let launch = create_launch(&ctx).await;

    ctx.stubs.llm.fail_with("model overloaded");
    let (status, body) = ctx
        .post(&format!("/v1/launches/{}/plan", launch["id"].as_str().unwrap()), json!({}))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI generation failed");
    assert!(body["details"].as_str().unwrap().contains("model overloaded"));

    let (_, usage) = ctx.get("/v1/usage").await;
    assert_eq!(usage["aiCallsUsed"], 0);
}

#[tokio::test]
async fn test_regenerate_task_takes_new_schedule() {
    let Some(ctx) = TestContext::new(Plan::Pro).await else {
        return;
    };
    let launch = create_launch(&ctx).await;
    let launch_id = launch["id"].as_str().unwrap();

    let (status, task) = ctx
        .post(
            &format!("/v1/launches/{}/tasks", launch_id),
            json!({
                "title": "Post a teaser",
                "phase": "Pre-Launch",
                "due_date": "2024-06-02T09:00:00Z"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let task_id = task["id"].as_str().unwrap().to_string();

    ctx.stubs.llm.respond_with(
        r#"{"title": "Film a 15s serum texture teaser", "phase": "Pre-Launch", "platform": "TikTok", "day_offset": 6}"#,
    );
    let (status, body) = ctx
        .post(&format!("/v1/tasks/{}/regenerate", task_id), json!({}))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["id"], task_id);
    assert_eq!(body["order"], 1);
    assert_eq!(body["title"], "Film a 15s serum texture teaser");
    assert_eq!(body["platform"], "TikTok");
    assert_eq!(body["ai_generated"], true);
    assert_eq!(body["due_date"], "2024-06-07T12:00:00Z");

    let (_, usage) = ctx.get("/v1/usage").await;
    assert_eq!(usage["aiCallsUsed"], 1);
}

#[tokio::test]
async fn test_patch_can_clear_optional_fields() {
    let Some(ctx) = TestContext::new(Plan::Free).await else {
        return;
    };
    let launch = create_launch(&ctx).await;
    let launch_id = launch["id"].as_str().unwrap();

    let (_, task) = ctx
        .post(
            &format!("/v1/launches/{}/tasks", launch_id),
            json!({
                "title": "Email the waitlist",
                "platform": "Email",
                "due_date": "2024-06-03T12:00:00Z",
                "post_time": "18:30:00"
            }),
        )
        .await;
    let uri = format!("/v1/tasks/{}", task["id"].as_str().unwrap());

    let (status, body) = ctx.patch(&uri, json!({ "clear": ["due_date", "post_time"] })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["due_date"].is_null());
    assert!(body["post_time"].is_null());
    assert_eq!(body["platform"], "Email");

    let (status, body) = ctx
        .patch(
            &format!("/v1/launches/{}", launch_id),
            json!({ "clear": ["launch_end"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["launch_end"].is_null());
    assert_eq!(body["launch_start"], "2024-06-01");
}

#[tokio::test]
async fn test_copy_generation_stores_strategy_outline() {
    let Some(ctx) = TestContext::new(Plan::Pro).await else {
        return;
    };
    let launch = create_launch(&ctx).await;
    let launch_id = launch["id"].as_str().unwrap();

    let (status, task) = ctx
        .post(
            &format!("/v1/launches/{}/tasks", launch_id),
            json!({ "title": "Map the competitor landscape", "phase": "Research & Setup" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["order"], 1);

    ctx.stubs
        .llm
        .respond_with("```html\n<b>Summary</b>\n\n- List five competitors\n```");
    let (status, body) = ctx
        .post(&format!("/v1/tasks/{}/copy", task["id"].as_str().unwrap()), json!({}))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["mode"], "strategy");
    assert_eq!(body["task"]["outline"], "<b>Summary</b>\n\n- List five competitors");
}

#[tokio::test]
async fn test_other_users_launch_is_not_found() {
    let Some(owner) = TestContext::new(Plan::Free).await else {
        return;
    };
    let Some(intruder) = TestContext::new(Plan::Free).await else {
        return;
    };
    let launch = create_launch(&owner).await;
    let uri = format!("/v1/launches/{}", launch["id"].as_str().unwrap());

    let (status, body) = intruder.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Launch not found");

    let (status, _) = intruder.post(&format!("{}/archive", uri), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = intruder.delete(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_policy_follows_plan() {
    let Some(free) = TestContext::new(Plan::Free).await else {
        return;
    };
    let launch = create_launch(&free).await;
    let (status, body) = free
        .delete(&format!("/v1/launches/{}", launch["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["policy"], "soft_archive");
    assert_eq!(body["status"], "archived");

    let Some(pro) = TestContext::new(Plan::Pro).await else {
        return;
    };
    let launch = create_launch(&pro).await;
    let uri = format!("/v1/launches/{}", launch["id"].as_str().unwrap());
    let (_, body) = pro.delete(&uri).await;
    assert_eq!(body["policy"], "hard_delete");
    assert_eq!(body["status"], "deleted");

    let (status, _) = pro.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_calendar_export() {
    let Some(ctx) = TestContext::new(Plan::Pro).await else {
        return;
    };
    let launch = create_launch(&ctx).await;
    let launch_id = launch["id"].as_str().unwrap();

    ctx.stubs.llm.respond_with(PLAN_COMPLETION);
    let (status, _) = ctx.post(&format!("/v1/launches/{}/plan", launch_id), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .uri(format!("/v1/launches/{}/calendar.ics", launch_id))
        .header("authorization", &ctx.auth)
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/calendar; charset=utf-8"
    );
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"summer-serum.ics\""
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let ics = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 3);
    assert!(ics.contains("DTSTART:20240601T120000Z"));
}

#[tokio::test]
async fn test_checkout_and_webhook_upgrade() {
    let Some(ctx) = TestContext::new(Plan::Free).await else {
        return;
    };

    let (status, body) = ctx.post("/v1/billing/checkout", json!({ "plan": "pro" })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["session_id"], "cs_test_pro");

    let user = User::find_by_id(&ctx.db, ctx.user.id).await.unwrap().unwrap();
    assert_eq!(user.stripe_customer_id.as_deref(), Some("cus_test"));

    let payload = json!({
        "id": "evt_checkout",
        "type": "checkout.session.completed",
        "data": { "object": {
            "client_reference_id": ctx.user.id.to_string(),
            "customer": "cus_test",
            "subscription": "sub_123",
            "metadata": { "plan": "pro" }
        }}
    })
    .to_string();
    let now = Utc::now().timestamp();
    let signature = WebhookVerifier::new(WEBHOOK_SECRET)
        .sign(now, payload.as_bytes())
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/billing/webhook")
        .header("stripe-signature", format!("t={},v1={}", now, signature))
        .body(Body::from(payload))
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = User::find_by_id(&ctx.db, ctx.user.id).await.unwrap().unwrap();
    assert_eq!(user.plan_tier(), Plan::Pro);
    assert_eq!(user.stripe_subscription_id.as_deref(), Some("sub_123"));
    assert_eq!(user.subscription_status.as_deref(), Some("active"));

    let (status, body) = ctx.post("/v1/billing/portal", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["url"].as_str().unwrap().starts_with("https://billing.stripe.test/portal"));
}
