//! SubscriptionLifecycle - applies payment and provider events to
//! subscriptions and the entitlement counters derived from them.
//!
//! Every transition writes an absolute target state, so replays and most
//! reorderings converge. There is no transaction around the multi-row
//! writes; a failure part way through is repaired by the provider's retry,
//! since each step is idempotent.

use std::sync::Arc;

use crate::domain::billing::{
    BillingError, PlanCatalog, ProfileStatus, Subscription, SubscriptionRef,
};
use crate::domain::foundation::UserId;
use crate::ports::{Clock, PaymentRepository, ProfileRepository, SubscriptionRepository};

pub struct SubscriptionLifecycle {
    catalog: Arc<PlanCatalog>,
    profiles: Arc<dyn ProfileRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<dyn PaymentRepository>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionLifecycle {
    pub fn new(
        catalog: Arc<PlanCatalog>,
        profiles: Arc<dyn ProfileRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            profiles,
            subscriptions,
            payments,
            clock,
        }
    }

    /// Activates the plan paid for by `order_id`.
    ///
    /// Idempotent per order: once a subscription exists for the order it is
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` - no order recorded under `order_id`
    /// - `InvalidState` - the order was captured by a different payment
    /// - `UnknownPlan` - the order's plan left the catalog
    pub async fn activate(
        &self,
        order_id: &str,
        payment_id: &str,
    ) -> Result<Subscription, BillingError> {
        let now = self.clock.now();

        // 1. Capture the payment
        let mut payment = self
            .payments
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| BillingError::payment_not_found(order_id))?;
        if payment.capture(payment_id, now)? {
            self.payments.update(&payment).await?;
        }

        // 2. Already activated for this order?
        if let Some(existing) = self.subscriptions.find_by_order_id(order_id).await? {
            tracing::debug!(order_id, subscription_id = %existing.id, "Order already activated");
            return Ok(existing);
        }

        let plan = self.catalog.require(payment.plan_key.as_str())?;
        let user_id = &payment.user_id;

        // 3. Reset entitlements to the plan
        self.profiles.activate_plan(user_id, plan, now).await?;

        // 4. Close whatever subscription this one replaces
        for mut previous in self.subscriptions.find_active(user_id).await? {
            if previous.provider_order_id.as_deref() == Some(order_id) {
                return Ok(previous);
            }
            if previous.supersede(now)? {
                self.subscriptions.update(&previous).await?;
                tracing::info!(
                    user_id = %user_id,
                    subscription_id = %previous.id,
                    "Superseded previous subscription"
                );
            }
        }

        // 5. Start the new period
        let subscription = Subscription::start(user_id.clone(), plan, order_id, now);
        if let Err(e) = self.subscriptions.insert(&subscription).await {
            // A concurrent activation of the same order got there first.
            if let Some(existing) = self.subscriptions.find_by_order_id(order_id).await? {
                return Ok(existing);
            }
            return Err(e.into());
        }

        tracing::info!(
            user_id = %user_id,
            order_id,
            plan = %plan.key,
            subscription_id = %subscription.id,
            "Subscription activated"
        );
        Ok(subscription)
    }

    /// Marks the order's payment failed. Profiles are untouched.
    pub async fn record_payment_failure(
        &self,
        order_id: &str,
        payment_id: &str,
    ) -> Result<bool, BillingError> {
        let mut payment = self
            .payments
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| BillingError::payment_not_found(order_id))?;

        let changed = payment.fail(payment_id, self.clock.now())?;
        if changed {
            self.payments.update(&payment).await?;
            tracing::info!(order_id, payment_id, "Payment failed");
        }
        Ok(changed)
    }

    /// Provider ended the subscription: the identity drops to the free ceiling
    /// unless another subscription is still active.
    pub async fn provider_cancelled(
        &self,
        reference: &SubscriptionRef,
    ) -> Result<Option<Subscription>, BillingError> {
        let now = self.clock.now();
        let Some(mut subscription) = self.locate(reference).await? else {
            return Ok(None);
        };

        if subscription.cancel_by_provider(now)? {
            self.subscriptions.update(&subscription).await?;
        }

        if self.subscriptions.find_active(&subscription.user_id).await?.is_empty() {
            self.profiles.revert_to_free(&subscription.user_id, now).await?;
        }

        tracing::info!(
            user_id = %subscription.user_id,
            subscription_id = %subscription.id,
            "Subscription cancelled by provider"
        );
        Ok(Some(subscription))
    }

    pub async fn provider_paused(
        &self,
        reference: &SubscriptionRef,
    ) -> Result<Option<Subscription>, BillingError> {
        let now = self.clock.now();
        let Some(mut subscription) = self.locate(reference).await? else {
            return Ok(None);
        };
        if subscription.pause(now)? {
            self.subscriptions.update(&subscription).await?;
        }
        Ok(Some(subscription))
    }

    pub async fn provider_resumed(
        &self,
        reference: &SubscriptionRef,
    ) -> Result<Option<Subscription>, BillingError> {
        let now = self.clock.now();
        let Some(mut subscription) = self.locate(reference).await? else {
            return Ok(None);
        };
        if subscription.resume(now)? {
            self.supersede_others(&subscription).await?;
            self.subscriptions.update(&subscription).await?;
        }
        Ok(Some(subscription))
    }

    /// Provider reports the subscription active, from any state.
    pub async fn provider_activated(
        &self,
        reference: &SubscriptionRef,
    ) -> Result<Option<Subscription>, BillingError> {
        let now = self.clock.now();
        let Some(mut subscription) = self.locate(reference).await? else {
            return Ok(None);
        };
        if subscription.activate(now)? {
            self.supersede_others(&subscription).await?;
            self.subscriptions.update(&subscription).await?;
        }

        self.profiles
            .set_status(&subscription.user_id, ProfileStatus::Active, now)
            .await?;

        Ok(Some(subscription))
    }

    /// Finds the row a provider event refers to.
    ///
    /// Matches on the provider subscription id first, then falls back to the
    /// current subscription of the identity named in the event notes. A row
    /// found through the fallback is linked to the provider id.
    async fn locate(
        &self,
        reference: &SubscriptionRef,
    ) -> Result<Option<Subscription>, BillingError> {
        if let Some(found) = self
            .subscriptions
            .find_by_provider_subscription_id(&reference.provider_subscription_id)
            .await?
        {
            return Ok(Some(found));
        }

        let Some(user_id) = reference
            .user_id
            .as_deref()
            .and_then(|raw| UserId::new(raw).ok())
        else {
            return Ok(None);
        };

        let Some(mut current) = self.subscriptions.find_current(&user_id).await? else {
            return Ok(None);
        };
        if current.provider_subscription_id.is_none() {
            current.provider_subscription_id = Some(reference.provider_subscription_id.clone());
            self.subscriptions.update(&current).await?;
        }
        Ok(Some(current))
    }

    async fn supersede_others(&self, keep: &Subscription) -> Result<(), BillingError> {
        let now = self.clock.now();
        for mut other in self.subscriptions.find_active(&keep.user_id).await? {
            if other.id != keep.id && other.supersede(now)? {
                self.subscriptions.update(&other).await?;
            }
        }
        Ok(())
    }
}
