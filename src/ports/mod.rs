//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Audit Ports
//!
//! - `AuditEngine` - Opaque storefront scoring
//! - `AuditRepository` - Durable results for identified callers
//! - `ResultCache` - TTL-bound results for anonymous callers
//!
//! ## Billing Ports
//!
//! - `ProfileRepository` - Entitlement counters with atomic reservation
//! - `SubscriptionRepository` - Append-only subscription history
//! - `PaymentRepository` - One row per provider order
//! - `WebhookEventRepository` - Delivery de-duplication
//! - `PaymentGateway` - Provider order creation
//!
//! ## Cross-cutting
//!
//! - `Clock` - Injectable time source
//! - `SessionValidator` - Bearer token validation

mod audit_engine;
mod audit_repository;
mod clock;
mod payment_gateway;
mod payment_repository;
mod profile_repository;
mod result_cache;
mod session_validator;
mod subscription_repository;
mod webhook_event_repository;

pub use audit_engine::AuditEngine;
pub use audit_repository::AuditRepository;
pub use clock::Clock;
pub use payment_gateway::{CreateOrderRequest, PaymentGateway, PaymentGatewayError, ProviderOrder};
pub use payment_repository::PaymentRepository;
pub use profile_repository::ProfileRepository;
pub use result_cache::ResultCache;
pub use session_validator::SessionValidator;
pub use subscription_repository::SubscriptionRepository;
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};
