//! In-process payment gateway for tests and local development.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{CreateOrderRequest, PaymentGateway, PaymentGatewayError, ProviderOrder};

#[derive(Debug, Default)]
struct MockState {
    next_order: u64,
    next_error: Option<PaymentGatewayError>,
    requests: Vec<CreateOrderRequest>,
}

/// Hands out sequential order ids (`order_test_1`, `order_test_2`, ...).
#[derive(Debug, Clone, Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next `create_order` call with `error`.
    pub fn fail_next(&self, error: PaymentGatewayError) {
        self.lock().next_error = Some(error);
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CreateOrderRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<ProviderOrder, PaymentGatewayError> {
        let mut state = self.lock();
        state.requests.push(request.clone());
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        state.next_order += 1;
        Ok(ProviderOrder {
            id: format!("order_test_{}", state.next_order),
            amount: request.amount,
            currency: request.currency,
        })
    }
}
