//! Billing handlers.
//!
//! ## Commands
//! - Creating a provider order for a plan
//! - Verifying a checkout payment and activating the plan
//! - Cancelling the current subscription
//! - Processing signed payment webhooks
//!
//! ## Queries
//! - Current entitlement (profile quota plus current subscription)
//!
//! Verification and the `payment.captured` webhook share one activation
//! path in `SubscriptionLifecycle`.

mod cancel_subscription;
mod create_order;
mod get_entitlement;
mod handle_payment_webhook;
mod payment_event_dispatcher;
mod subscription_lifecycle;
mod verify_payment;

#[cfg(test)]
mod test_support;

// Commands
pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use create_order::{CreateOrderCommand, CreateOrderHandler, CreateOrderResult};
pub use handle_payment_webhook::{HandlePaymentWebhookCommand, HandlePaymentWebhookHandler};
pub use verify_payment::{VerifyPaymentCommand, VerifyPaymentHandler};

// Queries
pub use get_entitlement::{EntitlementView, GetEntitlementHandler, GetEntitlementQuery};

// Shared
pub use payment_event_dispatcher::PaymentEventDispatcher;
pub use subscription_lifecycle::SubscriptionLifecycle;
