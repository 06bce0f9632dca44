//! CreateOrderHandler - Command handler for starting a plan purchase.

use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::billing::{BillingError, Payment, Plan, PlanCatalog};
use crate::domain::foundation::UserId;
use crate::ports::{
    Clock, CreateOrderRequest, PaymentGateway, PaymentRepository, ProfileRepository, ProviderOrder,
};

/// Command to create an order for a plan.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    pub plan_type: String,
}

/// Order details the checkout widget needs.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order: ProviderOrder,
    pub plan: Plan,
    /// Public key id for the checkout widget.
    pub key_id: String,
}

pub struct CreateOrderHandler {
    catalog: Arc<PlanCatalog>,
    gateway: Arc<dyn PaymentGateway>,
    payments: Arc<dyn PaymentRepository>,
    profiles: Arc<dyn ProfileRepository>,
    clock: Arc<dyn Clock>,
    key_id: String,
}

impl CreateOrderHandler {
    pub fn new(
        catalog: Arc<PlanCatalog>,
        gateway: Arc<dyn PaymentGateway>,
        payments: Arc<dyn PaymentRepository>,
        profiles: Arc<dyn ProfileRepository>,
        clock: Arc<dyn Clock>,
        key_id: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            gateway,
            payments,
            profiles,
            clock,
            key_id: key_id.into(),
        }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, BillingError> {
        // 1. Resolve the plan
        let plan_type = cmd.plan_type.trim();
        if plan_type.is_empty() {
            return Err(BillingError::missing_field("planType"));
        }
        let plan = self.catalog.require(plan_type)?.clone();

        // 2. Payments reference the profile row
        let now = self.clock.now();
        self.profiles.ensure(&cmd.user_id, now).await?;

        // 3. Create the order at the provider
        let mut notes = BTreeMap::new();
        notes.insert("user_id".to_string(), cmd.user_id.to_string());
        notes.insert("plan".to_string(), plan.key.to_string());
        let request = CreateOrderRequest {
            amount: plan.amount,
            currency: plan.currency.clone(),
            receipt: format!("rcpt_{}", Uuid::new_v4().simple()),
            notes,
        };

        let order = self.gateway.create_order(request).await.map_err(|e| {
            tracing::error!(user_id = %cmd.user_id, plan = %plan.key, error = %e, "Order creation failed");
            BillingError::provider(e.to_string())
        })?;

        // 4. Remember which plan the order pays for
        let payment = Payment::for_order(cmd.user_id.clone(), &plan, &order.id, now);
        self.payments.insert(&payment).await?;

        tracing::info!(
            user_id = %cmd.user_id,
            order_id = %order.id,
            plan = %plan.key,
            "Order created"
        );

        Ok(CreateOrderResult {
            order,
            plan,
            key_id: self.key_id.clone(),
        })
    }
}
