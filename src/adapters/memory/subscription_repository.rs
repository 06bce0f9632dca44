use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::SubscriptionRepository;

/// Subscriptions in insertion order.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionRepository {
    rows: RwLock<Vec<Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row for the user, oldest first.
    pub async fn history(&self, user_id: &UserId) -> Vec<Subscription> {
        self.rows
            .read()
            .await
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.rows.write().await.push(subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|s| s.id == subscription.id) {
            Some(row) => {
                *row = subscription.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription not found: {}", subscription.id),
            )),
        }
    }

    async fn find_current(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .rev()
            .find(|s| &s.user_id == user_id)
            .cloned())
    }

    async fn find_active(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|s| &s.user_id == user_id && s.is_active())
            .cloned()
            .collect())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|s| s.provider_order_id.as_deref() == Some(order_id))
            .cloned())
    }

    async fn find_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .rev()
            .find(|s| s.provider_subscription_id.as_deref() == Some(provider_subscription_id))
            .cloned())
    }

    async fn increment_period_usage(&self, user_id: &UserId) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows
            .iter_mut()
            .rev()
            .find(|s| &s.user_id == user_id && s.is_active())
        {
            row.audits_used_this_period += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::PlanCatalog;
    use crate::domain::foundation::Timestamp;

    fn start(user: &str, order: &str) -> Subscription {
        Subscription::start(
            UserId::new(user).unwrap(),
            PlanCatalog::standard().require("starter").unwrap(),
            order,
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn current_is_most_recently_inserted() {
        let repo = InMemorySubscriptionRepository::new();
        let first = start("u-1", "order_1");
        let second = start("u-1", "order_2");
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        let current = repo.find_current(&first.user_id).await.unwrap().unwrap();
        assert_eq!(current.id, second.id);
    }

    #[tokio::test]
    async fn update_unknown_row_fails() {
        let repo = InMemorySubscriptionRepository::new();
        let err = repo.update(&start("u-1", "order_1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }

    #[tokio::test]
    async fn increment_touches_only_active_row() {
        let repo = InMemorySubscriptionRepository::new();
        let mut old = start("u-1", "order_1");
        old.supersede(Timestamp::now()).unwrap();
        let new = start("u-1", "order_2");
        repo.insert(&old).await.unwrap();
        repo.insert(&new).await.unwrap();

        repo.increment_period_usage(&new.user_id).await.unwrap();

        let history = repo.history(&new.user_id).await;
        assert_eq!(history[0].audits_used_this_period, 0);
        assert_eq!(history[1].audits_used_this_period, 1);
    }
}
