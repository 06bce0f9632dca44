//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresProfileRepository` - entitlement counters, atomic reservation
//! - `PostgresAuditRepository` - results of identified callers
//! - `PostgresSubscriptionRepository` - append-only subscription history
//! - `PostgresPaymentRepository` - one row per provider order
//! - `PostgresWebhookEventRepository` - handled webhook deliveries

mod audit_repository;
mod payment_repository;
mod profile_repository;
mod subscription_repository;
mod webhook_event_repository;

pub use audit_repository::PostgresAuditRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use profile_repository::PostgresProfileRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

fn db_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, err))
}

fn corrupt(column: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value in database: {}", column, err),
    )
}

fn parse_user_id(raw: String) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(|e| corrupt("user_id", e))
}
