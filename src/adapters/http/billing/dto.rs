//! Request and response bodies for payment, subscription, and plan endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::{
    CancelSubscriptionResult, CreateOrderResult, EntitlementView,
};
use crate::domain::billing::{Plan, Profile, Subscription};
use crate::domain::foundation::Timestamp;
use crate::ports::WebhookResult;

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/payments/orders`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    #[serde(default)]
    pub plan_type: String,
}

/// Body of `POST /api/payments/verify`.
///
/// Absent fields deserialize as empty and are reported by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentBody {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub plan_type: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// Everything the checkout widget needs to open.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order: OrderView,
    pub plan: Plan,
    pub key_id: String,
}

impl From<CreateOrderResult> for CreateOrderResponse {
    fn from(result: CreateOrderResult) -> Self {
        Self {
            success: true,
            order: OrderView {
                id: result.order.id,
                amount: result.order.amount,
                currency: result.order.currency,
            },
            plan: result.plan,
            key_id: result.key_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub success: bool,
    pub subscription: Subscription,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            success: true,
            subscription,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionResponse {
    pub success: bool,
    pub subscription: Subscription,
    /// Paid access continues until this instant.
    pub effective_at: Timestamp,
}

impl From<CancelSubscriptionResult> for CancelSubscriptionResponse {
    fn from(result: CancelSubscriptionResult) -> Self {
        Self {
            success: true,
            subscription: result.subscription,
            effective_at: result.effective_at,
        }
    }
}

/// Quota counters plus the current subscription, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementResponse {
    pub success: bool,
    pub profile: Profile,
    pub audits_remaining: i32,
    pub subscription: Option<Subscription>,
}

impl From<EntitlementView> for EntitlementResponse {
    fn from(view: EntitlementView) -> Self {
        Self {
            success: true,
            audits_remaining: view.profile.audits_remaining(),
            profile: view.profile,
            subscription: view.subscription,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlansResponse {
    pub success: bool,
    pub plans: Vec<Plan>,
}

/// Acknowledgement returned to the payment provider.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub status: &'static str,
}

impl From<&WebhookResult> for WebhookAck {
    fn from(result: &WebhookResult) -> Self {
        Self {
            received: true,
            status: result.as_str(),
        }
    }
}
