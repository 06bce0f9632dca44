//! In-memory wiring shared by the billing handler tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::clock::ManualClock;
use crate::adapters::memory::{
    InMemoryPaymentRepository, InMemoryProfileRepository, InMemorySubscriptionRepository,
};
use crate::domain::billing::{Payment, Plan, PlanCatalog, Profile, ProfileStatus, QuotaDecision};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{Clock, PaymentRepository, ProfileRepository};

use super::SubscriptionLifecycle;

pub struct BillingFixture {
    pub catalog: Arc<PlanCatalog>,
    pub clock: Arc<ManualClock>,
    pub profiles: Arc<InMemoryProfileRepository>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub payments: Arc<InMemoryPaymentRepository>,
    pub lifecycle: Arc<SubscriptionLifecycle>,
}

impl BillingFixture {
    pub fn new() -> Self {
        let catalog = Arc::new(PlanCatalog::standard());
        let clock = Arc::new(ManualClock::default());
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let payments = Arc::new(InMemoryPaymentRepository::new());
        let lifecycle = Arc::new(SubscriptionLifecycle::new(
            catalog.clone(),
            profiles.clone(),
            subscriptions.clone(),
            payments.clone(),
            clock.clone(),
        ));
        Self {
            catalog,
            clock,
            profiles,
            subscriptions,
            payments,
            lifecycle,
        }
    }

    pub fn clock_dyn(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// A lifecycle sharing this fixture's repositories except for `profiles`.
    pub fn lifecycle_with(&self, profiles: Arc<dyn ProfileRepository>) -> SubscriptionLifecycle {
        SubscriptionLifecycle::new(
            self.catalog.clone(),
            profiles,
            self.subscriptions.clone(),
            self.payments.clone(),
            self.clock.clone(),
        )
    }

    /// Records a created order for `user` on `plan`, as create-order would.
    pub async fn seed_order(&self, user: &UserId, plan: &str, order_id: &str) -> Payment {
        self.profiles.ensure(user, self.now()).await.unwrap();
        let plan = self.catalog.require(plan).unwrap();
        let payment = Payment::for_order(user.clone(), plan, order_id, self.now());
        self.payments.insert(&payment).await.unwrap();
        payment
    }
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

/// Profile store where one audit run reserves quota in the middle of the
/// first profile write it sees: after a read has been answered, or just
/// before a targeted update lands.
pub struct ReservingProfiles {
    inner: Arc<InMemoryProfileRepository>,
    pending: AtomicBool,
}

impl ReservingProfiles {
    pub fn new(inner: Arc<InMemoryProfileRepository>) -> Self {
        Self {
            inner,
            pending: AtomicBool::new(true),
        }
    }

    async fn reserve_once(&self, user_id: &UserId, now: Timestamp) -> Result<(), DomainError> {
        if self.pending.swap(false, Ordering::SeqCst) {
            let decision = self.inner.try_reserve_audit(user_id, now).await?;
            assert!(decision.is_granted(), "concurrent reservation should fit");
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for ReservingProfiles {
    async fn find(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        self.inner.find(user_id).await
    }

    async fn ensure(&self, user_id: &UserId, now: Timestamp) -> Result<Profile, DomainError> {
        let profile = self.inner.ensure(user_id, now).await?;
        self.reserve_once(user_id, now).await?;
        Ok(profile)
    }

    async fn try_reserve_audit(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<QuotaDecision, DomainError> {
        self.inner.try_reserve_audit(user_id, now).await
    }

    async fn release_audit(&self, user_id: &UserId, now: Timestamp) -> Result<(), DomainError> {
        self.inner.release_audit(user_id, now).await
    }

    async fn activate_plan(
        &self,
        user_id: &UserId,
        plan: &Plan,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.inner.activate_plan(user_id, plan, now).await
    }

    async fn set_status(
        &self,
        user_id: &UserId,
        status: ProfileStatus,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.reserve_once(user_id, now).await?;
        self.inner.set_status(user_id, status, now).await
    }

    async fn revert_to_free(&self, user_id: &UserId, now: Timestamp) -> Result<(), DomainError> {
        self.reserve_once(user_id, now).await?;
        self.inner.revert_to_free(user_id, now).await
    }

    async fn save(&self, profile: &Profile) -> Result<(), DomainError> {
        self.inner.save(profile).await
    }
}
