//! HTTP handlers for payment, subscription, and plan endpoints.
//!
//! These handlers connect axum routes to the billing command and query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use secrecy::{ExposeSecret, SecretString};

use crate::application::handlers::billing::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CreateOrderCommand, CreateOrderHandler,
    GetEntitlementHandler, GetEntitlementQuery, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, PaymentEventDispatcher, SubscriptionLifecycle,
    VerifyPaymentCommand, VerifyPaymentHandler,
};
use crate::domain::billing::{
    BillingError, IdempotentWebhookProcessor, PaymentSignatureVerifier, PlanCatalog, WebhookError,
    WebhookSignatureVerifier,
};
use crate::ports::{
    Clock, PaymentGateway, PaymentRepository, ProfileRepository, SubscriptionRepository,
    WebhookEventRepository,
};

use super::super::error::ErrorResponse;
use super::super::middleware::RequireAuth;
use super::dto::{
    CancelSubscriptionResponse, CreateOrderBody, CreateOrderResponse, EntitlementResponse,
    PlansResponse, SubscriptionResponse, VerifyPaymentBody, WebhookAck,
};

/// Header carrying the hex HMAC of the raw webhook body.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Header carrying the provider's delivery id.
pub const EVENT_ID_HEADER: &str = "x-event-id";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Provider credentials used by the billing endpoints.
#[derive(Debug, Clone)]
pub struct PaymentCredentials {
    /// Public key id handed to the checkout widget.
    pub key_id: String,
    /// Signs the checkout `orderId|paymentId` payload.
    pub key_secret: SecretString,
    /// Signs webhook bodies.
    pub webhook_secret: SecretString,
}

/// Dependencies of the billing endpoints.
#[derive(Clone)]
pub struct BillingAppState {
    pub catalog: Arc<PlanCatalog>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub clock: Arc<dyn Clock>,
    pub credentials: PaymentCredentials,
    lifecycle: Arc<SubscriptionLifecycle>,
}

impl BillingAppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<PlanCatalog>,
        gateway: Arc<dyn PaymentGateway>,
        profiles: Arc<dyn ProfileRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentRepository>,
        webhook_events: Arc<dyn WebhookEventRepository>,
        clock: Arc<dyn Clock>,
        credentials: PaymentCredentials,
    ) -> Self {
        let lifecycle = Arc::new(SubscriptionLifecycle::new(
            catalog.clone(),
            profiles.clone(),
            subscriptions.clone(),
            payments.clone(),
            clock.clone(),
        ));
        Self {
            catalog,
            gateway,
            profiles,
            subscriptions,
            payments,
            webhook_events,
            clock,
            credentials,
            lifecycle,
        }
    }

    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(
            self.catalog.clone(),
            self.gateway.clone(),
            self.payments.clone(),
            self.profiles.clone(),
            self.clock.clone(),
            self.credentials.key_id.clone(),
        )
    }

    pub fn verify_payment_handler(&self) -> VerifyPaymentHandler {
        VerifyPaymentHandler::new(
            PaymentSignatureVerifier::new(self.credentials.key_secret.expose_secret().clone()),
            self.payments.clone(),
            self.lifecycle.clone(),
        )
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(
            self.profiles.clone(),
            self.subscriptions.clone(),
            self.clock.clone(),
        )
    }

    pub fn entitlement_handler(&self) -> GetEntitlementHandler {
        GetEntitlementHandler::new(
            self.profiles.clone(),
            self.subscriptions.clone(),
            self.clock.clone(),
        )
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        let dispatcher = Arc::new(PaymentEventDispatcher::new(self.lifecycle.clone()));
        HandlePaymentWebhookHandler::new(
            WebhookSignatureVerifier::new(self.credentials.webhook_secret.expose_secret().clone()),
            IdempotentWebhookProcessor::new(self.webhook_events.clone(), dispatcher),
            self.clock.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/orders - Create a provider order for a plan
pub async fn create_order(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreateOrderBody>,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = CreateOrderCommand {
        user_id: user.id,
        plan_type: body.plan_type,
    };

    let result = state.create_order_handler().handle(cmd).await?;
    Ok(Json(CreateOrderResponse::from(result)))
}

/// POST /api/payments/verify - Verify a checkout payment and activate the plan
pub async fn verify_payment(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<VerifyPaymentBody>,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = VerifyPaymentCommand {
        user_id: user.id,
        order_id: body.order_id,
        payment_id: body.payment_id,
        signature: body.signature,
        plan_type: body.plan_type,
    };

    let subscription = state.verify_payment_handler().handle(cmd).await?;
    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// POST /api/subscriptions/cancel - Cancel at the end of the current period
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = CancelSubscriptionCommand { user_id: user.id };

    let result = state.cancel_subscription_handler().handle(cmd).await?;
    Ok(Json(CancelSubscriptionResponse::from(result)))
}

/// POST /api/webhooks/payments - Signed provider notifications
pub async fn handle_payment_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature: header(SIGNATURE_HEADER),
        delivery_id: header(EVENT_ID_HEADER),
    };

    let result = state.webhook_handler().handle(cmd).await?;
    Ok(Json(WebhookAck::from(&result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/subscriptions/current - Quota counters and the current subscription
pub async fn get_current_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let view = state
        .entitlement_handler()
        .handle(GetEntitlementQuery { user_id: user.id })
        .await?;
    Ok(Json(EntitlementResponse::from(view)))
}

/// GET /api/plans - The plan catalog
pub async fn list_plans(State(state): State<BillingAppState>) -> impl IntoResponse {
    Json(PlansResponse {
        success: true,
        plans: state.catalog.plans().cloned().collect(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BillingError::UnknownPlan(_)
            | BillingError::PlanMismatch { .. }
            | BillingError::MissingField(_)
            | BillingError::InvalidPaymentSignature => StatusCode::BAD_REQUEST,
            BillingError::PaymentNotFound(_) | BillingError::NoActiveSubscription => {
                StatusCode::NOT_FOUND
            }
            BillingError::InvalidState { .. } => StatusCode::CONFLICT,
            BillingError::Provider(_) => {
                tracing::error!(error = %self.0, "Payment provider call failed");
                StatusCode::BAD_GATEWAY
            }
            BillingError::Infrastructure(_) => {
                tracing::error!(error = %self.0, "Billing request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ErrorResponse::new(self.0.code().to_string(), self.0.message()).into_response_with(status)
    }
}

/// API error type for webhook deliveries.
///
/// Only authenticity failures (400) and storage failures (500) reach the
/// provider as errors; everything else is acknowledged upstream.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let code = match &self.0 {
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::ParseError(_) => "INVALID_PAYLOAD",
            WebhookError::MissingField(_) | WebhookError::Ignored(_) => "IGNORED",
            WebhookError::Database(_) => {
                tracing::error!(error = %self.0, "Webhook delivery failed; provider will retry");
                "DATABASE_ERROR"
            }
        };

        if status.is_success() {
            return (
                status,
                Json(WebhookAck {
                    received: true,
                    status: "ignored",
                }),
            )
                .into_response();
        }

        ErrorResponse::new(code, self.0.to_string()).into_response_with(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::memory::{
        InMemoryPaymentRepository, InMemoryProfileRepository, InMemorySubscriptionRepository,
        InMemoryWebhookEventRepository,
    };
    use crate::adapters::razorpay::MockPaymentGateway;
    use crate::domain::billing::sign_payload;
    use crate::domain::foundation::{AuthenticatedUser, UserId};
    use crate::ports::WebhookResult;

    const KEY_SECRET: &str = "key-secret";
    const WEBHOOK_SECRET: &str = "webhook-secret";

    fn test_state() -> BillingAppState {
        BillingAppState::new(
            Arc::new(PlanCatalog::standard()),
            Arc::new(MockPaymentGateway::new()),
            Arc::new(InMemoryProfileRepository::new()),
            Arc::new(InMemorySubscriptionRepository::new()),
            Arc::new(InMemoryPaymentRepository::new()),
            Arc::new(InMemoryWebhookEventRepository::new()),
            Arc::new(ManualClock::default()),
            PaymentCredentials {
                key_id: "rzp_test_key".to_string(),
                key_secret: SecretString::new(KEY_SECRET.to_string()),
                webhook_secret: SecretString::new(WEBHOOK_SECRET.to_string()),
            },
        )
    }

    fn caller(id: &str) -> RequireAuth {
        RequireAuth(AuthenticatedUser::new(UserId::new(id).unwrap(), None))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn order_for(state: &BillingAppState, user: &str, plan: &str) -> String {
        let body = CreateOrderBody {
            plan_type: plan.to_string(),
        };
        let response = create_order(State(state.clone()), caller(user), Json(body))
            .await
            .unwrap()
            .into_response();
        body_json(response).await["order"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn billing_errors_map_to_statuses() {
        let cases = [
            (BillingError::unknown_plan("gold"), StatusCode::BAD_REQUEST),
            (BillingError::plan_mismatch("starter", "growth"), StatusCode::BAD_REQUEST),
            (BillingError::missing_field("orderId"), StatusCode::BAD_REQUEST),
            (BillingError::InvalidPaymentSignature, StatusCode::BAD_REQUEST),
            (BillingError::payment_not_found("order_1"), StatusCode::NOT_FOUND),
            (BillingError::NoActiveSubscription, StatusCode::NOT_FOUND),
            (BillingError::invalid_state("cancelled", "pause"), StatusCode::CONFLICT),
            (BillingError::provider("timeout"), StatusCode::BAD_GATEWAY),
            (BillingError::infrastructure("db"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(BillingApiError(err).into_response().status(), status);
        }
    }

    #[test]
    fn webhook_errors_keep_provider_semantics() {
        let rejected = WebhookApiError(WebhookError::InvalidSignature).into_response();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let acknowledged = WebhookApiError(WebhookError::Ignored("x".into())).into_response();
        assert_eq!(acknowledged.status(), StatusCode::OK);

        let retried = WebhookApiError(WebhookError::Database("down".into())).into_response();
        assert_eq!(retried.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Order and Verification Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn create_order_returns_order_and_key_id() {
        let state = test_state();
        let body = CreateOrderBody {
            plan_type: "growth".to_string(),
        };

        let response = create_order(State(state), caller("alice"), Json(body))
            .await
            .unwrap()
            .into_response();

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["order"]["id"], "order_test_1");
        assert_eq!(json["order"]["amount"], 249_900);
        assert_eq!(json["keyId"], "rzp_test_key");
    }

    #[tokio::test]
    async fn create_order_with_unknown_plan_is_400() {
        let body = CreateOrderBody {
            plan_type: "platinum".to_string(),
        };
        let err = create_order(State(test_state()), caller("alice"), Json(body))
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_with_valid_signature_activates_plan() {
        let state = test_state();
        let order_id = order_for(&state, "alice", "starter").await;
        let signature = sign_payload(KEY_SECRET, format!("{}|pay_1", order_id).as_bytes());

        let body = VerifyPaymentBody {
            order_id,
            payment_id: "pay_1".to_string(),
            signature,
            plan_type: "starter".to_string(),
        };
        let response = verify_payment(State(state.clone()), caller("alice"), Json(body))
            .await
            .unwrap()
            .into_response();
        let json = body_json(response).await;
        assert_eq!(json["subscription"]["status"], "active");
        assert_eq!(json["subscription"]["auditsPerMonth"], 10);

        let current = get_current_subscription(State(state), caller("alice"))
            .await
            .unwrap()
            .into_response();
        let json = body_json(current).await;
        assert_eq!(json["profile"]["auditsLimit"], 10);
        assert_eq!(json["auditsRemaining"], 10);
    }

    #[tokio::test]
    async fn verify_with_wrong_signature_is_400_and_creates_nothing() {
        let state = test_state();
        let order_id = order_for(&state, "alice", "starter").await;

        let body = VerifyPaymentBody {
            order_id,
            payment_id: "pay_1".to_string(),
            signature: sign_payload("wrong-secret", b"anything"),
            plan_type: "starter".to_string(),
        };
        let err = verify_payment(State(state.clone()), caller("alice"), Json(body))
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let user = UserId::new("alice").unwrap();
        assert!(state.subscriptions.find_active(&user).await.unwrap().is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Subscription Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn cancel_without_active_subscription_is_404() {
        let err = cancel_subscription(State(test_state()), caller("bob"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn current_subscription_for_new_user_shows_free_quota() {
        let response = get_current_subscription(State(test_state()), caller("carol"))
            .await
            .unwrap()
            .into_response();
        let json = body_json(response).await;
        assert_eq!(json["profile"]["subscriptionTier"], "free");
        assert_eq!(json["auditsRemaining"], 3);
        assert!(json["subscription"].is_null());
    }

    #[tokio::test]
    async fn list_plans_returns_catalog() {
        let response = list_plans(State(test_state())).await.into_response();
        let json = body_json(response).await;
        assert_eq!(json["plans"].as_array().unwrap().len(), 3);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook Tests
    // ════════════════════════════════════════════════════════════════════════════

    fn signed_headers(payload: &[u8], event_id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, sign_payload(WEBHOOK_SECRET, payload).parse().unwrap());
        headers.insert(EVENT_ID_HEADER, event_id.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn webhook_without_signature_is_400() {
        let err = handle_payment_webhook(
            State(test_state()),
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_with_unknown_event_is_acknowledged() {
        let payload = br#"{"event":"invoice.generated","payload":{}}"#;
        let response = handle_payment_webhook(
            State(test_state()),
            signed_headers(payload, "evt_1"),
            Bytes::from_static(payload),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["received"], true);
    }

    #[tokio::test]
    async fn webhook_duplicate_delivery_is_already_processed() {
        let state = test_state();
        let payload = br#"{"event":"invoice.generated","payload":{}}"#;

        handle_payment_webhook(
            State(state.clone()),
            signed_headers(payload, "evt_dup"),
            Bytes::from_static(payload),
        )
        .await
        .unwrap();

        let response = handle_payment_webhook(
            State(state),
            signed_headers(payload, "evt_dup"),
            Bytes::from_static(payload),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(
            body_json(response).await["status"],
            WebhookResult::AlreadyProcessed.as_str()
        );
    }
}
