//! CancelSubscriptionHandler - Command handler for user-initiated cancellation.
//!
//! Cancellation takes effect at the end of the current period. The profile
//! is marked cancelled but keeps its paid limit until then.

use std::sync::Arc;

use crate::domain::billing::{BillingError, ProfileStatus, Subscription};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{Clock, ProfileRepository, SubscriptionRepository};

#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub subscription: Subscription,
    /// When paid access ends.
    pub effective_at: Timestamp,
}

pub struct CancelSubscriptionHandler {
    profiles: Arc<dyn ProfileRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            subscriptions,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, BillingError> {
        let now = self.clock.now();

        // 1. Most recent active subscription
        let mut subscription = self
            .subscriptions
            .find_active(&cmd.user_id)
            .await?
            .into_iter()
            .max_by_key(|s| s.created_at)
            .ok_or(BillingError::NoActiveSubscription)?;

        // 2. Cancel at period end
        subscription.cancel_by_user(now)?;
        self.subscriptions.update(&subscription).await?;

        // 3. Profile status only; the limit stays until period end
        self.profiles
            .set_status(&cmd.user_id, ProfileStatus::Cancelled, now)
            .await?;

        tracing::info!(
            user_id = %cmd.user_id,
            subscription_id = %subscription.id,
            "Subscription cancelled by user"
        );

        Ok(CancelSubscriptionResult {
            effective_at: subscription.current_end,
            subscription,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{user, BillingFixture, ReservingProfiles};
    use super::*;
    use crate::domain::billing::{ProfileStatus, SubscriptionStatus};

    fn handler(f: &BillingFixture) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(f.profiles.clone(), f.subscriptions.clone(), f.clock_dyn())
    }

    #[tokio::test]
    async fn cancels_at_period_end_keeping_limit() {
        let f = BillingFixture::new();
        let alice = user("alice");
        f.seed_order(&alice, "growth", "order_1").await;
        let active = f.lifecycle.activate("order_1", "pay_1").await.unwrap();

        let result = handler(&f)
            .handle(CancelSubscriptionCommand { user_id: alice.clone() })
            .await
            .unwrap();

        assert_eq!(result.subscription.status, SubscriptionStatus::Cancelled);
        assert!(result.subscription.cancel_at_period_end);
        assert!(result.subscription.cancelled_at.is_some());
        assert_eq!(result.effective_at, active.current_end);

        let profile = f.profiles.find(&alice).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, ProfileStatus::Cancelled);
        assert_eq!(profile.subscription_tier, "growth");
        assert_eq!(profile.audits_limit, 50);
    }

    #[tokio::test]
    async fn reservation_during_cancel_is_kept() {
        let f = BillingFixture::new();
        let alice = user("alice");
        f.seed_order(&alice, "growth", "order_1").await;
        f.lifecycle.activate("order_1", "pay_1").await.unwrap();
        let handler = CancelSubscriptionHandler::new(
            Arc::new(ReservingProfiles::new(f.profiles.clone())),
            f.subscriptions.clone(),
            f.clock_dyn(),
        );

        handler
            .handle(CancelSubscriptionCommand { user_id: alice.clone() })
            .await
            .unwrap();

        let profile = f.profiles.find(&alice).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, ProfileStatus::Cancelled);
        assert_eq!(profile.audits_used, 1);
        assert_eq!(profile.audits_limit, 50);
    }

    #[tokio::test]
    async fn nothing_active_is_reported() {
        let f = BillingFixture::new();

        let err = handler(&f)
            .handle(CancelSubscriptionCommand { user_id: user("alice") })
            .await
            .unwrap_err();

        assert_eq!(err, BillingError::NoActiveSubscription);
    }

    #[tokio::test]
    async fn second_cancel_finds_nothing_active() {
        let f = BillingFixture::new();
        let alice = user("alice");
        f.seed_order(&alice, "starter", "order_1").await;
        f.lifecycle.activate("order_1", "pay_1").await.unwrap();
        let handler = handler(&f);

        handler.handle(CancelSubscriptionCommand { user_id: alice.clone() }).await.unwrap();
        let err = handler
            .handle(CancelSubscriptionCommand { user_id: alice.clone() })
            .await
            .unwrap_err();

        assert_eq!(err, BillingError::NoActiveSubscription);
        assert_eq!(f.subscriptions.history(&alice).await.len(), 1);
    }
}
