//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod audit;
pub mod billing;

pub use audit::{
    GetAuditHandler, GetAuditQuery, ListAuditsHandler, ListAuditsQuery, RunAuditCommand,
    RunAuditHandler,
};
pub use billing::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
    CreateOrderCommand, CreateOrderHandler, CreateOrderResult, EntitlementView,
    GetEntitlementHandler, GetEntitlementQuery, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, PaymentEventDispatcher, SubscriptionLifecycle,
    VerifyPaymentCommand, VerifyPaymentHandler,
};
