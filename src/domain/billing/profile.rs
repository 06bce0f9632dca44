//! Per-identity entitlement counters.
//!
//! The profile is what the entitlement gate reads. Subscription events
//! rewrite it; audit runs consume from it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, UserId, ValidationError};

use super::{Plan, FREE_AUDITS_LIMIT, FREE_TIER};

/// Billing status as seen by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Free,
    Active,
    Cancelled,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Free => "free",
            ProfileStatus::Active => "active",
            ProfileStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ProfileStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(ProfileStatus::Free),
            "active" => Ok(ProfileStatus::Active),
            "cancelled" => Ok(ProfileStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "subscription_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Outcome of asking for one more audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// One audit was reserved; `used` already includes it.
    Granted { used: i32, limit: i32 },
    /// Nothing was reserved.
    Exhausted { used: i32, limit: i32 },
}

impl QuotaDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, QuotaDecision::Granted { .. })
    }
}

/// Entitlement record for one identity.
///
/// # Invariants
///
/// - `audits_used >= 0`
/// - A run is granted only while `audits_used < audits_limit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: UserId,
    /// `free` or a plan key.
    pub subscription_tier: String,
    pub subscription_status: ProfileStatus,
    pub audits_used: i32,
    pub audits_limit: i32,
    pub updated_at: Timestamp,
}

impl Profile {
    /// A fresh free-tier profile.
    pub fn new_free(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            subscription_tier: FREE_TIER.to_string(),
            subscription_status: ProfileStatus::Free,
            audits_used: 0,
            audits_limit: FREE_AUDITS_LIMIT,
            updated_at: now,
        }
    }

    pub fn has_quota(&self) -> bool {
        self.audits_used < self.audits_limit
    }

    pub fn audits_remaining(&self) -> i32 {
        (self.audits_limit - self.audits_used).max(0)
    }

    /// Check-and-increment in one step.
    ///
    /// Repositories call this while holding whatever guard makes the
    /// read-modify-write indivisible.
    pub fn try_reserve(&mut self, now: Timestamp) -> QuotaDecision {
        if !self.has_quota() {
            return QuotaDecision::Exhausted {
                used: self.audits_used,
                limit: self.audits_limit,
            };
        }
        self.audits_used += 1;
        self.updated_at = now;
        QuotaDecision::Granted {
            used: self.audits_used,
            limit: self.audits_limit,
        }
    }

    /// Gives back one reserved audit; never goes below zero.
    pub fn release(&mut self, now: Timestamp) {
        self.audits_used = (self.audits_used - 1).max(0);
        self.updated_at = now;
    }

    /// Paid activation: plan tier, fresh counter, plan limit.
    pub fn activate_plan(&mut self, plan: &Plan, now: Timestamp) {
        self.subscription_tier = plan.key.as_str().to_string();
        self.subscription_status = ProfileStatus::Active;
        self.audits_used = 0;
        self.audits_limit = plan.audits_per_month;
        self.updated_at = now;
    }

    /// Status change only; tier, limit and counter are untouched.
    pub fn set_status(&mut self, status: ProfileStatus, now: Timestamp) {
        self.subscription_status = status;
        self.updated_at = now;
    }

    /// User cancelled; the paid limit stays until period end.
    pub fn mark_cancelled(&mut self, now: Timestamp) {
        self.set_status(ProfileStatus::Cancelled, now);
    }

    /// Provider ended the subscription; back to the free ceiling.
    pub fn revert_to_free(&mut self, now: Timestamp) {
        self.subscription_status = ProfileStatus::Cancelled;
        self.subscription_tier = FREE_TIER.to_string();
        self.audits_limit = FREE_AUDITS_LIMIT;
        self.updated_at = now;
    }

    /// Provider re-activated the subscription.
    ///
    /// Flips the status only. It does not restore the plan's tier or limit,
    /// so after `revert_to_free` the profile stays at the free ceiling until
    /// a new activation goes through `activate_plan`.
    pub fn mark_active(&mut self, now: Timestamp) {
        self.set_status(ProfileStatus::Active, now);
    }
}
