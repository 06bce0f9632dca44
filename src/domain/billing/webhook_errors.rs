//! Webhook error types.
//!
//! Status codes steer the provider's retry behaviour: 2xx acknowledges,
//! 4xx is never retried, 5xx is retried later.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

use super::BillingError;

#[derive(Debug, Error)]
pub enum WebhookError {
    /// No signature header on the delivery.
    #[error("Missing signature")]
    MissingSignature,

    /// Signature did not verify against the raw body.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Body is not a valid event envelope.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A recognized event lacks a field it needs.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Event acknowledged without changing state.
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Storage failed; the delivery should be retried.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the provider should redeliver.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_))
    }

    /// Authenticity failures; logged and discarded.
    pub fn is_authenticity_failure(&self) -> bool {
        matches!(self, WebhookError::MissingSignature | WebhookError::InvalidSignature)
    }

    /// Maps the error to an HTTP status code.
    ///
    /// Everything after a passing signature is acknowledged except storage
    /// failures, which ask for redelivery.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::ParseError(_)
            | WebhookError::MissingField(_)
            | WebhookError::Ignored(_) => StatusCode::OK,
            WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

impl From<BillingError> for WebhookError {
    fn from(err: BillingError) -> Self {
        if err.is_retryable() {
            WebhookError::Database(err.to_string())
        } else {
            WebhookError::Ignored(err.to_string())
        }
    }
}
