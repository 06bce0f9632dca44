//! Payment rows, one per provider order.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{PaymentId, StateMachine, Timestamp, UserId, ValidationError};

use super::{BillingError, Plan, PlanKey};

/// Payment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Captured,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "created",
            PaymentStatus::Captured => "captured",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(PaymentStatus::Created),
            "captured" => Ok(PaymentStatus::Captured),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown payment status '{}'", other),
            )),
        }
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Created, Captured)
                | (Created, Failed)
                // A later attempt on the same order can still succeed
                | (Failed, Captured)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Created => vec![Captured, Failed],
            Failed => vec![Captured],
            Captured => vec![],
        }
    }
}

/// A provider order and what became of it.
///
/// # Invariants
///
/// - `provider_order_id` is unique across all rows
/// - once captured, `provider_payment_id` never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub plan_key: PlanKey,
    pub provider_order_id: String,
    pub provider_payment_id: Option<String>,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Records a freshly created provider order.
    pub fn for_order(
        user_id: UserId,
        plan: &Plan,
        provider_order_id: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            user_id,
            plan_key: plan.key.clone(),
            provider_order_id: provider_order_id.into(),
            provider_payment_id: None,
            amount: plan.amount,
            currency: plan.currency.clone(),
            status: PaymentStatus::Created,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.status == PaymentStatus::Captured
    }

    /// Marks the order paid by `payment_id`.
    ///
    /// Returns whether anything changed. Capturing again with the same
    /// payment id is a no-op; a different payment id is rejected.
    pub fn capture(&mut self, payment_id: &str, now: Timestamp) -> Result<bool, BillingError> {
        if self.is_captured() {
            return match self.provider_payment_id.as_deref() {
                Some(existing) if existing != payment_id => Err(BillingError::invalid_state(
                    "captured",
                    format!("capture with payment {}", payment_id),
                )),
                _ => Ok(false),
            };
        }
        self.status = self
            .status
            .transition_to(PaymentStatus::Captured)
            .map_err(|_| BillingError::invalid_state(self.status.as_str(), "capture"))?;
        self.provider_payment_id = Some(payment_id.to_string());
        self.updated_at = now;
        Ok(true)
    }

    /// Marks a failed attempt. Only a `created` row moves to `failed`.
    pub fn fail(&mut self, payment_id: &str, now: Timestamp) -> Result<bool, BillingError> {
        match self.status {
            PaymentStatus::Failed => Ok(false),
            PaymentStatus::Captured => Err(BillingError::invalid_state("captured", "fail")),
            PaymentStatus::Created => {
                self.status = PaymentStatus::Failed;
                self.provider_payment_id = Some(payment_id.to_string());
                self.updated_at = now;
                Ok(true)
            }
        }
    }
}
