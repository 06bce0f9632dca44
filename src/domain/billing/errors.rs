//! Billing-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | UnknownPlan | 400 |
//! | PlanMismatch | 400 |
//! | MissingField | 400 |
//! | InvalidPaymentSignature | 400 |
//! | PaymentNotFound | 404 |
//! | NoActiveSubscription | 404 |
//! | InvalidState | 409 |
//! | Provider | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Billing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Plan key is not in the catalog.
    UnknownPlan(String),

    /// Plan named at verification differs from the plan the order was created for.
    PlanMismatch { expected: String, actual: String },

    /// Required request field missing or blank.
    MissingField(String),

    /// Checkout payment signature did not match.
    InvalidPaymentSignature,

    /// No payment row for the provider order (or it belongs to someone else).
    PaymentNotFound(String),

    /// The caller has no active subscription.
    NoActiveSubscription,

    /// Transition not allowed from the current state.
    InvalidState { current: String, attempted: String },

    /// The payment provider rejected or failed a call.
    Provider(String),

    /// Infrastructure error.
    Infrastructure(String),
}

impl BillingError {
    pub fn unknown_plan(key: impl Into<String>) -> Self {
        BillingError::UnknownPlan(key.into())
    }

    pub fn plan_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        BillingError::PlanMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        BillingError::MissingField(field.into())
    }

    pub fn payment_not_found(order_id: impl Into<String>) -> Self {
        BillingError::PaymentNotFound(order_id.into())
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        BillingError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        BillingError::Provider(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::UnknownPlan(_)
            | BillingError::PlanMismatch { .. }
            | BillingError::MissingField(_) => ErrorCode::ValidationFailed,
            BillingError::InvalidPaymentSignature => ErrorCode::InvalidFormat,
            BillingError::PaymentNotFound(_) => ErrorCode::PaymentNotFound,
            BillingError::NoActiveSubscription => ErrorCode::SubscriptionNotFound,
            BillingError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            BillingError::Provider(_) => ErrorCode::PaymentProviderError,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            BillingError::UnknownPlan(key) => format!("Unknown plan: {}", key),
            BillingError::PlanMismatch { expected, actual } => format!(
                "Order was created for plan '{}', not '{}'",
                expected, actual
            ),
            BillingError::MissingField(field) => format!("Missing required field: {}", field),
            BillingError::InvalidPaymentSignature => "Invalid payment signature".to_string(),
            BillingError::PaymentNotFound(order_id) => format!("Order not found: {}", order_id),
            BillingError::NoActiveSubscription => "No active subscription".to_string(),
            BillingError::InvalidState { current, attempted } => {
                format!("Cannot {} a {} subscription", attempted, current)
            }
            BillingError::Provider(_) => "Payment provider unavailable".to_string(),
            BillingError::Infrastructure(_) => "Internal error".to_string(),
        }
    }

    /// Returns true if the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::Provider(_) | BillingError::Infrastructure(_))
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingError::Provider(detail) | BillingError::Infrastructure(detail) => {
                write!(f, "{} ({})", self.message(), detail)
            }
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for BillingError {}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PaymentProviderError => BillingError::Provider(err.message),
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => BillingError::MissingField(field),
            other => BillingError::Infrastructure(other.to_string()),
        }
    }
}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_validation_code() {
        assert_eq!(BillingError::unknown_plan("x").code(), ErrorCode::ValidationFailed);
        assert_eq!(
            BillingError::plan_mismatch("starter", "growth").code(),
            ErrorCode::ValidationFailed
        );
        assert_eq!(BillingError::missing_field("orderId").code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn plan_mismatch_message_names_both_plans() {
        let msg = BillingError::plan_mismatch("starter", "agency").message();
        assert!(msg.contains("starter"));
        assert!(msg.contains("agency"));
    }

    #[test]
    fn only_dependency_failures_are_retryable() {
        assert!(BillingError::provider("timeout").is_retryable());
        assert!(BillingError::infrastructure("db").is_retryable());
        assert!(!BillingError::InvalidPaymentSignature.is_retryable());
        assert!(!BillingError::NoActiveSubscription.is_retryable());
    }

    #[test]
    fn provider_domain_error_stays_provider() {
        let err: BillingError = DomainError::new(ErrorCode::PaymentProviderError, "502").into();
        assert_eq!(err, BillingError::Provider("502".to_string()));
    }

    #[test]
    fn empty_field_validation_becomes_missing_field() {
        let err: BillingError = ValidationError::empty_field("paymentId").into();
        assert_eq!(err, BillingError::MissingField("paymentId".to_string()));
    }

    #[test]
    fn infrastructure_detail_hidden_from_message() {
        let err = BillingError::infrastructure("connection reset");
        assert_eq!(err.message(), "Internal error");
        assert!(err.to_string().contains("connection reset"));
    }
}
