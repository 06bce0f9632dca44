//! Profile repository port.
//!
//! The entitlement gate relies on `try_reserve_audit` being a single
//! indivisible storage operation: check `audits_used < audits_limit` and
//! increment in one step, so concurrent requests at the boundary cannot
//! both pass.
//!
//! Subscription transitions go through targeted writes that leave
//! `audits_used` alone, so a reservation landing between a read and a
//! status change is never overwritten.

use async_trait::async_trait;

use crate::domain::billing::{Plan, Profile, ProfileStatus, QuotaDecision};
use crate::domain::foundation::{DomainError, Timestamp, UserId};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find a profile.
    async fn find(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError>;

    /// Return the profile, creating a free one first if none exists.
    async fn ensure(&self, user_id: &UserId, now: Timestamp) -> Result<Profile, DomainError>;

    /// Atomically reserve one audit.
    ///
    /// Creates a free profile first if none exists. Returns `Exhausted`
    /// without changing anything when the limit is reached.
    async fn try_reserve_audit(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<QuotaDecision, DomainError>;

    /// Give back one reserved audit (floored at zero).
    async fn release_audit(&self, user_id: &UserId, now: Timestamp) -> Result<(), DomainError>;

    /// Paid activation: plan tier and limit, status active, counter reset.
    ///
    /// Creates the profile first if none exists.
    async fn activate_plan(
        &self,
        user_id: &UserId,
        plan: &Plan,
        now: Timestamp,
    ) -> Result<(), DomainError>;

    /// Change the billing status only. Tier, limit and counter are kept.
    ///
    /// Creates a free profile first if none exists.
    async fn set_status(
        &self,
        user_id: &UserId,
        status: ProfileStatus,
        now: Timestamp,
    ) -> Result<(), DomainError>;

    /// Drop to the free tier and limit with status cancelled. The counter is kept.
    ///
    /// Creates a free profile first if none exists.
    async fn revert_to_free(&self, user_id: &UserId, now: Timestamp) -> Result<(), DomainError>;

    /// Insert or overwrite the whole profile, counter included.
    ///
    /// Meant for seeding and administration; request paths use the targeted
    /// writes above.
    async fn save(&self, profile: &Profile) -> Result<(), DomainError>;
}
