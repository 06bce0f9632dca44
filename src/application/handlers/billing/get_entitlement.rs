//! GetEntitlementHandler - Query handler for the caller's quota and plan.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Profile, Subscription};
use crate::domain::foundation::UserId;
use crate::ports::{Clock, ProfileRepository, SubscriptionRepository};

#[derive(Debug, Clone)]
pub struct GetEntitlementQuery {
    pub user_id: UserId,
}

/// Profile counters plus the current subscription, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementView {
    pub profile: Profile,
    pub subscription: Option<Subscription>,
}

pub struct GetEntitlementHandler {
    profiles: Arc<dyn ProfileRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl GetEntitlementHandler {
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

    /// Identities without a profile row see the free defaults; nothing is written.
    pub async fn handle(&self, query: GetEntitlementQuery) -> Result<EntitlementView, BillingError> {
        let profile = match self.profiles.find(&query.user_id).await? {
            Some(profile) => profile,
            None => Profile::new_free(query.user_id.clone(), self.clock.now()),
        };
        let subscription = self.subscriptions.find_current(&query.user_id).await?;

        Ok(EntitlementView {
            profile,
            subscription,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{user, BillingFixture};
    use super::*;
    use crate::domain::billing::{ProfileStatus, FREE_AUDITS_LIMIT};

    fn handler(f: &BillingFixture) -> GetEntitlementHandler {
        GetEntitlementHandler::new(f.profiles.clone(), f.subscriptions.clone(), f.clock_dyn())
    }

    #[tokio::test]
    async fn unknown_identity_sees_free_defaults_without_write() {
        let f = BillingFixture::new();

        let view = handler(&f)
            .handle(GetEntitlementQuery { user_id: user("alice") })
            .await
            .unwrap();

        assert_eq!(view.profile.subscription_status, ProfileStatus::Free);
        assert_eq!(view.profile.audits_limit, FREE_AUDITS_LIMIT);
        assert!(view.subscription.is_none());
        assert!(f.profiles.find(&user("alice")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn shows_current_subscription() {
        let f = BillingFixture::new();
        f.seed_order(&user("alice"), "agency", "order_1").await;
        let active = f.lifecycle.activate("order_1", "pay_1").await.unwrap();

        let view = handler(&f)
            .handle(GetEntitlementQuery { user_id: user("alice") })
            .await
            .unwrap();

        assert_eq!(view.subscription, Some(active));
        assert_eq!(view.profile.audits_limit, 200);
    }
}
