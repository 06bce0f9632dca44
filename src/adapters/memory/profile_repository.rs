use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::billing::{Plan, Profile, ProfileStatus, QuotaDecision};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::ProfileRepository;

#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<UserId, Profile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `change` to the stored profile under the write lock, creating a
    /// free profile first if needed.
    async fn modify<F>(&self, user_id: &UserId, now: Timestamp, change: F)
    where
        F: FnOnce(&mut Profile),
    {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(user_id.clone())
            .or_insert_with(|| Profile::new_free(user_id.clone(), now));
        change(profile);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn ensure(&self, user_id: &UserId, now: Timestamp) -> Result<Profile, DomainError> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles
            .entry(user_id.clone())
            .or_insert_with(|| Profile::new_free(user_id.clone(), now))
            .clone())
    }

    async fn try_reserve_audit(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<QuotaDecision, DomainError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(user_id.clone())
            .or_insert_with(|| Profile::new_free(user_id.clone(), now));
        Ok(profile.try_reserve(now))
    }

    async fn release_audit(&self, user_id: &UserId, now: Timestamp) -> Result<(), DomainError> {
        if let Some(profile) = self.profiles.write().await.get_mut(user_id) {
            profile.release(now);
        }
        Ok(())
    }

    async fn activate_plan(
        &self,
        user_id: &UserId,
        plan: &Plan,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.modify(user_id, now, |p| p.activate_plan(plan, now)).await;
        Ok(())
    }

    async fn set_status(
        &self,
        user_id: &UserId,
        status: ProfileStatus,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.modify(user_id, now, |p| p.set_status(status, now)).await;
        Ok(())
    }

    async fn revert_to_free(&self, user_id: &UserId, now: Timestamp) -> Result<(), DomainError> {
        self.modify(user_id, now, |p| p.revert_to_free(now)).await;
        Ok(())
    }

    async fn save(&self, profile: &Profile) -> Result<(), DomainError> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}
