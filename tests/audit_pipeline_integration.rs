//! End-to-end tests for the audit endpoints.
//!
//! The full router runs against in-memory repositories, a scripted audit
//! engine and a manual clock, so cache expiry and quota enforcement can be
//! observed through HTTP alone.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront_audit::adapters::analysis::MockAuditEngine;
use storefront_audit::adapters::auth::MockSessionValidator;
use storefront_audit::adapters::http::{
    build_router, AuditAppState, BillingAppState, HttpOptions, PaymentCredentials,
};
use storefront_audit::adapters::memory::{
    InMemoryAuditRepository, InMemoryPaymentRepository, InMemoryProfileRepository,
    InMemorySubscriptionRepository, InMemoryWebhookEventRepository,
};
use storefront_audit::adapters::razorpay::MockPaymentGateway;
use storefront_audit::adapters::{InMemoryResultCache, ManualClock};
use storefront_audit::domain::billing::PlanCatalog;

// =============================================================================
// Test Infrastructure
// =============================================================================

const TOKEN: &str = "token-merchant";
const USER: &str = "merchant-1";

struct Harness {
    app: Router,
    clock: ManualClock,
    engine: MockAuditEngine,
}

fn harness() -> Harness {
    let clock = ManualClock::default();
    let engine = MockAuditEngine::default();
    let profiles = Arc::new(InMemoryProfileRepository::new());
    let subscriptions = Arc::new(InMemorySubscriptionRepository::new());

    let audit = AuditAppState {
        engine: Arc::new(engine.clone()),
        audits: Arc::new(InMemoryAuditRepository::new()),
        cache: Arc::new(InMemoryResultCache::with_default_ttl(Arc::new(clock.clone()), 100)),
        profiles: profiles.clone(),
        subscriptions: subscriptions.clone(),
        clock: Arc::new(clock.clone()),
    };
    let billing = BillingAppState::new(
        Arc::new(PlanCatalog::standard()),
        Arc::new(MockPaymentGateway::new()),
        profiles,
        subscriptions,
        Arc::new(InMemoryPaymentRepository::new()),
        Arc::new(InMemoryWebhookEventRepository::new()),
        Arc::new(clock.clone()),
        PaymentCredentials {
            key_id: "rzp_test_key".to_string(),
            key_secret: SecretString::new("key-secret".to_string()),
            webhook_secret: SecretString::new("webhook-secret".to_string()),
        },
    );
    let auth = Arc::new(MockSessionValidator::new().with_test_user(TOKEN, USER));

    Harness {
        app: build_router(audit, billing, auth, &HttpOptions::default()),
        clock,
        engine,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn run_audit(store_url: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/api/audits").header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(json!({ "storeUrl": store_url }).to_string()))
        .unwrap()
}

fn get_audit(id: &str) -> Request<Body> {
    Request::get(format!("/api/audits?id={}", id))
        .body(Body::empty())
        .unwrap()
}

// =============================================================================
// Anonymous Audits
// =============================================================================

#[tokio::test]
async fn anonymous_result_is_retrievable_until_it_expires() {
    let h = harness();

    let (status, created) = send(&h.app, run_audit("https://demo.myshopify.com", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], true);
    assert_eq!(created["audit"]["auditType"], "public");
    let id = created["audit"]["id"].as_str().unwrap().to_string();

    h.clock.advance(chrono::Duration::minutes(59));
    let (status, fetched) = send(&h.app, get_audit(&id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["audit"], created["audit"]);

    h.clock.advance(chrono::Duration::minutes(2));
    let (status, body) = send(&h.app, get_audit(&id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn blank_store_url_is_rejected_before_the_engine_runs() {
    let h = harness();

    let (status, body) = send(&h.app, run_audit("   ", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(h.engine.calls(), 0);
}

#[tokio::test]
async fn engine_failure_is_500_and_leaves_nothing_behind() {
    let h = harness();
    h.engine.fail_next("storefront unreachable");

    let (status, body) = send(&h.app, run_audit("https://down.myshopify.com", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn invalid_bearer_token_is_401() {
    let h = harness();

    let (status, body) = send(&h.app, run_audit("https://demo.myshopify.com", Some("forged"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(h.engine.calls(), 0);
}

// =============================================================================
// Authenticated Audits
// =============================================================================

#[tokio::test]
async fn free_quota_is_enforced_and_nothing_runs_past_it() {
    let h = harness();

    for _ in 0..3 {
        let (status, body) =
            send(&h.app, run_audit("https://demo.myshopify.com", Some(TOKEN))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["audit"]["auditType"], "authenticated");
    }

    let (status, body) = send(&h.app, run_audit("https://demo.myshopify.com", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["upgradeRequired"], true);
    assert_eq!(h.engine.calls(), 3);

    let history = Request::get("/api/audits/history")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, history).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn authenticated_results_do_not_expire() {
    let h = harness();

    let (_, created) = send(&h.app, run_audit("https://demo.myshopify.com", Some(TOKEN))).await;
    let id = created["audit"]["id"].as_str().unwrap().to_string();

    h.clock.advance(chrono::Duration::days(30));
    let (status, fetched) = send(&h.app, get_audit(&id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["audit"]["id"], created["audit"]["id"]);
}

#[tokio::test]
async fn failed_run_does_not_consume_quota() {
    let h = harness();
    h.engine.fail_next("timeout");

    let (status, _) = send(&h.app, run_audit("https://demo.myshopify.com", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let current = Request::get("/api/subscriptions/current")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, current).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auditsRemaining"], 3);
}

#[tokio::test]
async fn history_requires_a_caller() {
    let h = harness();

    let request = Request::get("/api/audits/history").body(Body::empty()).unwrap();
    let (status, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let h = harness();

    let (status, body) = send(&h.app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
