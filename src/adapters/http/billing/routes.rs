//! Axum router configuration for payment, subscription, and plan endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_subscription, create_order, get_current_subscription, handle_payment_webhook,
    list_plans, verify_payment, BillingAppState,
};

/// Checkout endpoints, mounted at `/api/payments` (authenticated).
///
/// - `POST /orders` - Create a provider order for a plan
/// - `POST /verify` - Verify the checkout signature and activate the plan
pub fn payment_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/verify", post(verify_payment))
}

/// Subscription endpoints, mounted at `/api/subscriptions` (authenticated).
///
/// - `GET /current` - Quota counters and the current subscription
/// - `POST /cancel` - Cancel at period end
pub fn subscription_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/current", get(get_current_subscription))
        .route("/cancel", post(cancel_subscription))
}

/// Provider webhooks, mounted at `/api/webhooks`.
///
/// No user authentication; deliveries are verified by signature.
///
/// - `POST /payments` - Signed payment and subscription events
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/payments", post(handle_payment_webhook))
}

/// Combined billing router, suitable for nesting under `/api`.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .nest("/payments", payment_routes())
        .nest("/subscriptions", subscription_routes())
        .nest("/webhooks", webhook_routes())
        .route("/plans", get(list_plans))
}
