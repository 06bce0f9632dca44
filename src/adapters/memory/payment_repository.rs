use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::billing::Payment;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::PaymentRepository;

/// Payments keyed by provider order id.
#[derive(Debug, Default)]
pub struct InMemoryPaymentRepository {
    payments: RwLock<HashMap<String, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.provider_order_id) {
            return Err(DomainError::validation(
                "orderId",
                format!("Payment already recorded for order {}", payment.provider_order_id),
            ));
        }
        payments.insert(payment.provider_order_id.clone(), payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(&payment.provider_order_id) {
            Some(existing) => {
                *existing = payment.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("No payment for order {}", payment.provider_order_id),
            )),
        }
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, DomainError> {
        Ok(self.payments.read().await.get(order_id).cloned())
    }
}
