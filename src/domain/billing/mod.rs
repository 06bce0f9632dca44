//! Billing domain module.
//!
//! Plans, per-identity entitlements, the subscription state machine, payment
//! rows, and everything needed to trust and interpret provider webhooks.
//!
//! # Module Structure
//!
//! - `plan` - `PlanCatalog` and the plans it offers
//! - `profile` - `Profile` entitlement counters and `QuotaDecision`
//! - `subscription` - `Subscription` aggregate and `SubscriptionStatus`
//! - `payment` - `Payment` rows and `PaymentStatus`
//! - `signature` - webhook body and checkout payment signature schemes
//! - `provider_event` - webhook envelope and `WebhookEventKind`
//! - `webhook_processor` - at-most-once application of webhook deliveries

mod errors;
mod payment;
mod plan;
mod profile;
mod provider_event;
mod signature;
mod subscription;
mod webhook_errors;
mod webhook_processor;

pub use errors::BillingError;
pub use payment::{Payment, PaymentStatus};
pub use plan::{Plan, PlanCatalog, PlanKey, FREE_AUDITS_LIMIT, FREE_TIER};
pub use profile::{Profile, ProfileStatus, QuotaDecision};
pub use provider_event::{
    EntityNotes, EventPayload, PaymentEntity, ProviderEvent, SubscriptionEntity, SubscriptionRef,
    WebhookEventKind, Wrapped,
};
pub use signature::{sign_payload, PaymentSignatureVerifier, WebhookSignatureVerifier};
pub use subscription::{Subscription, SubscriptionStatus};
pub use webhook_errors::WebhookError;
pub use webhook_processor::{IdempotentWebhookProcessor, WebhookDispatcher};
