//! HTTP adapter for billing endpoints.
//!
//! - `POST /api/payments/orders` - Create a provider order
//! - `POST /api/payments/verify` - Verify a checkout payment
//! - `GET /api/subscriptions/current` - Current entitlement
//! - `POST /api/subscriptions/cancel` - Cancel at period end
//! - `POST /api/webhooks/payments` - Signed provider webhooks
//! - `GET /api/plans` - Plan catalog

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{
    BillingApiError, BillingAppState, PaymentCredentials, WebhookApiError, EVENT_ID_HEADER,
    SIGNATURE_HEADER,
};
pub use routes::billing_router;
