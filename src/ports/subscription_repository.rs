//! Subscription repository port.
//!
//! History is append-only: rows are inserted once and updated in place,
//! never deleted.

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a new subscription row.
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Overwrite an existing row.
    ///
    /// # Errors
    ///
    /// `SubscriptionNotFound` if the row doesn't exist.
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Most recently created subscription for the user, in any status.
    async fn find_current(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError>;

    /// All active rows for the user (normally zero or one).
    async fn find_active(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError>;

    /// The subscription paid for by a provider order.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Subscription>, DomainError>;

    /// The subscription linked to a provider subscription id.
    async fn find_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Add one to `audits_used_this_period` of the user's active subscription.
    ///
    /// Relative update; a no-op when no subscription is active.
    async fn increment_period_usage(&self, user_id: &UserId) -> Result<(), DomainError>;
}
