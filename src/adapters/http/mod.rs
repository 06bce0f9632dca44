//! HTTP adapters - REST API implementations.
//!
//! Each domain module has its own HTTP adapter for endpoint exposure;
//! `router` assembles them with the shared middleware stack.

pub mod audit;
pub mod billing;
pub mod error;
pub mod middleware;
pub mod router;

// Re-export key types for convenience
pub use audit::{audit_routes, AuditAppState};
pub use billing::{billing_router, BillingAppState, PaymentCredentials};
pub use error::ErrorResponse;
pub use router::{build_router, HttpOptions};
