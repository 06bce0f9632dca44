//! Top-level router assembly.
//!
//! ```text
//! /health                       liveness
//! /api/audits                   audit endpoints
//! /api/payments/*               checkout
//! /api/subscriptions/*          entitlement and cancellation
//! /api/webhooks/payments        provider webhooks
//! /api/plans                    plan catalog
//! ```
//!
//! Every route sits behind the auth middleware; routes decide for themselves
//! whether a caller is required.

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::audit::{audit_routes, AuditAppState};
use super::billing::{billing_router, BillingAppState, EVENT_ID_HEADER, SIGNATURE_HEADER};
use super::middleware::{auth_middleware, AuthState};

/// Transport settings applied to every route.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub request_timeout: Duration,
    /// Allowed browser origins; `*` allows any.
    pub cors_origins: Vec<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// Builds the complete application router.
pub fn build_router(
    audit: AuditAppState,
    billing: BillingAppState,
    auth: AuthState,
    options: &HttpOptions,
) -> Router {
    let api = Router::new()
        .nest("/audits", audit_routes().with_state(audit))
        .merge(billing_router().with_state(billing));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            // outermost first
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(&options.cors_origins))
                .layer(TimeoutLayer::new(options.request_timeout))
                .layer(middleware::from_fn_with_state(auth, auth_middleware)),
        )
}

/// GET /health - Liveness; does not touch dependencies.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(SIGNATURE_HEADER),
            HeaderName::from_static(EVENT_ID_HEADER),
        ]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if allowed.is_empty() {
        layer
    } else {
        layer.allow_origin(allowed)
    }
}
