//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, error types, and the state machine
//! trait that form the vocabulary of the storefront audit domain.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AuditId, PaymentId, SubscriptionId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
