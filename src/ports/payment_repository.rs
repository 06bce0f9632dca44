//! Payment repository port.

use async_trait::async_trait;

use crate::domain::billing::Payment;
use crate::domain::foundation::DomainError;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a row for a freshly created order.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` if a row already exists for the order id.
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Overwrite an existing row.
    async fn update(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Find the row for a provider order.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, DomainError>;
}
