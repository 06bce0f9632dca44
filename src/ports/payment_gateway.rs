//! Payment gateway port.
//!
//! The only outbound call the billing core makes: creating an order the
//! browser checkout widget can pay. Everything after that arrives through
//! the verify endpoint or webhooks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Order to create at the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    /// Our reference, echoed back by the provider.
    pub receipt: String,
    /// Key/value pairs attached to the order (user id, plan key).
    pub notes: BTreeMap<String, String>,
}

/// Order as created by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentGatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider rejected credentials")]
    Authentication,

    #[error("Provider returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

impl PaymentGatewayError {
    /// True for failures worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentGatewayError::Network(_) => true,
            PaymentGatewayError::Rejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<PaymentGatewayError> for DomainError {
    fn from(err: PaymentGatewayError) -> Self {
        DomainError::new(ErrorCode::PaymentProviderError, err.to_string())
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<ProviderOrder, PaymentGatewayError>;
}
