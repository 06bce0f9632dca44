//! Subscription aggregate and its status state machine.
//!
//! Rows are append-only history: cancelling or superseding a subscription
//! changes its status, never deletes it. The most recently created row for
//! an identity is its current subscription.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, SubscriptionId, Timestamp, UserId, ValidationError};

use super::{BillingError, Plan, PlanKey};

/// Subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "paused" => Ok(SubscriptionStatus::Paused),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown subscription status '{}'", other),
            )),
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Active, Paused)
                | (Active, Cancelled)
                | (Paused, Active)
                | (Paused, Cancelled)
                // Provider re-activation
                | (Cancelled, Active)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Active => vec![Paused, Cancelled],
            Paused => vec![Active, Cancelled],
            Cancelled => vec![Active],
        }
    }
}

/// One billing period of a plan for one identity.
///
/// # Invariants
///
/// - `current_start < current_end`
/// - `cancelled_at` is set once, by the first cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_key: PlanKey,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    /// Order that paid for this subscription.
    pub provider_order_id: Option<String>,
    /// Provider-side recurring subscription id, when the provider reports one.
    pub provider_subscription_id: Option<String>,
    pub current_start: Timestamp,
    pub current_end: Timestamp,
    pub audits_per_month: i32,
    pub audits_used_this_period: i32,
    pub cancel_at_period_end: bool,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Starts a one-month period for a captured order.
    pub fn start(
        user_id: UserId,
        plan: &Plan,
        provider_order_id: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            user_id,
            plan_key: plan.key.clone(),
            plan_name: plan.name.clone(),
            status: SubscriptionStatus::Active,
            provider_order_id: Some(provider_order_id.into()),
            provider_subscription_id: None,
            current_start: now,
            current_end: now.add_months(1),
            audits_per_month: plan.audits_per_month,
            audits_used_this_period: 0,
            cancel_at_period_end: false,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// User-initiated cancellation, effective at period end.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the subscription is active.
    pub fn cancel_by_user(&mut self, now: Timestamp) -> Result<(), BillingError> {
        self.status = self
            .status
            .transition_to(SubscriptionStatus::Cancelled)
            .map_err(|_| self.invalid("cancel"))?;
        self.cancel_at_period_end = true;
        self.stamp_cancelled(now);
        self.updated_at = now;
        Ok(())
    }

    /// Provider reported the subscription cancelled.
    ///
    /// Returns whether anything changed; a repeat delivery changes nothing.
    pub fn cancel_by_provider(&mut self, now: Timestamp) -> Result<bool, BillingError> {
        self.settle(SubscriptionStatus::Cancelled, "cancel", now)
    }

    /// Provider reported the subscription paused.
    pub fn pause(&mut self, now: Timestamp) -> Result<bool, BillingError> {
        self.settle(SubscriptionStatus::Paused, "pause", now)
    }

    /// Provider reported the subscription resumed. Only a paused row resumes.
    pub fn resume(&mut self, now: Timestamp) -> Result<bool, BillingError> {
        if self.status == SubscriptionStatus::Cancelled {
            return Err(self.invalid("resume"));
        }
        self.settle(SubscriptionStatus::Active, "resume", now)
    }

    /// Provider reported the subscription active, from any state.
    pub fn activate(&mut self, now: Timestamp) -> Result<bool, BillingError> {
        let changed = self.settle(SubscriptionStatus::Active, "activate", now)?;
        if changed {
            self.cancel_at_period_end = false;
            self.cancelled_at = None;
        }
        Ok(changed)
    }

    /// Closes this row because a newer subscription replaced it.
    pub fn supersede(&mut self, now: Timestamp) -> Result<bool, BillingError> {
        self.settle(SubscriptionStatus::Cancelled, "replace", now)
    }

    fn settle(
        &mut self,
        target: SubscriptionStatus,
        action: &str,
        now: Timestamp,
    ) -> Result<bool, BillingError> {
        if self.status == target {
            return Ok(false);
        }
        self.status = self
            .status
            .settle_to(target)
            .map_err(|_| self.invalid(action))?;
        if target == SubscriptionStatus::Cancelled {
            self.stamp_cancelled(now);
        }
        self.updated_at = now;
        Ok(true)
    }

    fn stamp_cancelled(&mut self, now: Timestamp) {
        if self.cancelled_at.is_none() {
            self.cancelled_at = Some(now);
        }
    }

    fn invalid(&self, action: &str) -> BillingError {
        BillingError::invalid_state(self.status.as_str(), action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::PlanCatalog;
    use chrono::Duration;

    fn starter() -> Subscription {
        let catalog = PlanCatalog::standard();
        Subscription::start(
            UserId::new("user-1").unwrap(),
            catalog.require("starter").unwrap(),
            "order_1",
            Timestamp::now(),
        )
    }

    // ════════════════════════════════════════════════════════════════
    // State machine
    // ════════════════════════════════════════════════════════════════

    #[test]
    fn active_can_pause_or_cancel() {
        let s = SubscriptionStatus::Active;
        assert!(s.can_transition_to(&SubscriptionStatus::Paused));
        assert!(s.can_transition_to(&SubscriptionStatus::Cancelled));
    }

    #[test]
    fn cancelled_only_reactivates() {
        let s = SubscriptionStatus::Cancelled;
        assert_eq!(s.valid_transitions(), vec![SubscriptionStatus::Active]);
        assert!(!s.can_transition_to(&SubscriptionStatus::Paused));
        assert!(!s.is_terminal());
    }

    #[test]
    fn status_parses_its_own_strings() {
        for s in [
            SubscriptionStatus::Active,
            SubscriptionStatus::Paused,
            SubscriptionStatus::Cancelled,
        ] {
            assert_eq!(s.as_str().parse::<SubscriptionStatus>().unwrap(), s);
        }
    }

    // ════════════════════════════════════════════════════════════════
    // Aggregate
    // ════════════════════════════════════════════════════════════════

    #[test]
    fn start_opens_one_month_period() {
        let sub = starter();
        assert!(sub.is_active());
        assert_eq!(sub.audits_per_month, 10);
        assert_eq!(sub.audits_used_this_period, 0);
        assert!(sub.current_end.duration_since(&sub.current_start) >= Duration::days(28));
        assert!(sub.current_end.duration_since(&sub.current_start) <= Duration::days(31));
        assert_eq!(sub.provider_order_id.as_deref(), Some("order_1"));
    }

    #[test]
    fn user_cancel_sets_period_end_flag() {
        let mut sub = starter();
        let now = Timestamp::now();
        sub.cancel_by_user(now).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert!(sub.cancel_at_period_end);
        assert_eq!(sub.cancelled_at, Some(now));
    }

    #[test]
    fn user_cancel_of_cancelled_is_invalid() {
        let mut sub = starter();
        sub.cancel_by_user(Timestamp::now()).unwrap();
        assert!(matches!(
            sub.cancel_by_user(Timestamp::now()),
            Err(BillingError::InvalidState { .. })
        ));
    }

    #[test]
    fn provider_cancel_twice_equals_once() {
        let mut once = starter();
        let first = Timestamp::now();
        assert!(once.cancel_by_provider(first).unwrap());
        let snapshot = once.clone();

        assert!(!once.cancel_by_provider(first.plus_secs(30)).unwrap());
        assert_eq!(once, snapshot);
    }

    #[test]
    fn provider_cancel_from_paused() {
        let mut sub = starter();
        sub.pause(Timestamp::now()).unwrap();
        assert!(sub.cancel_by_provider(Timestamp::now()).unwrap());
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
    }

    #[test]
    fn provider_cancel_keeps_first_cancelled_at() {
        let mut sub = starter();
        let user_cancel = Timestamp::now();
        sub.cancel_by_user(user_cancel).unwrap();

        sub.cancel_by_provider(user_cancel.add_days(30)).unwrap();
        assert_eq!(sub.cancelled_at, Some(user_cancel));
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let mut sub = starter();
        assert!(sub.pause(Timestamp::now()).unwrap());
        assert!(!sub.pause(Timestamp::now()).unwrap());
        assert!(sub.resume(Timestamp::now()).unwrap());
        assert!(!sub.resume(Timestamp::now()).unwrap());
        assert!(sub.is_active());
    }

    #[test]
    fn cancelled_cannot_pause_or_resume() {
        let mut sub = starter();
        sub.cancel_by_provider(Timestamp::now()).unwrap();
        assert!(sub.pause(Timestamp::now()).is_err());
        assert!(sub.resume(Timestamp::now()).is_err());
    }

    #[test]
    fn activate_revives_cancelled_and_clears_cancellation() {
        let mut sub = starter();
        sub.cancel_by_user(Timestamp::now()).unwrap();

        assert!(sub.activate(Timestamp::now()).unwrap());
        assert!(sub.is_active());
        assert!(!sub.cancel_at_period_end);
        assert!(sub.cancelled_at.is_none());
        assert!(!sub.activate(Timestamp::now()).unwrap());
    }

    #[test]
    fn supersede_closes_active_row() {
        let mut sub = starter();
        assert!(sub.supersede(Timestamp::now()).unwrap());
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert!(!sub.cancel_at_period_end);
    }
}
