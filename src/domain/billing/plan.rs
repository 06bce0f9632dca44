//! Plan catalog.
//!
//! The catalog is an immutable table handed to every component that prices
//! an order, verifies a payment, or resets entitlements. Nothing looks plans
//! up globally, so tests can swap in their own catalog.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::foundation::ValidationError;

use super::BillingError;

/// Tier name recorded on profiles without a paid plan.
pub const FREE_TIER: &str = "free";

/// Audits per period for identities without a paid plan.
pub const FREE_AUDITS_LIMIT: i32 = 3;

/// Key identifying a plan (`starter`, `growth`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanKey(String);

impl PlanKey {
    /// Creates a plan key; lowercase ASCII letters, digits, `-` and `_` only.
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ValidationError::empty_field("planType"));
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "planType",
                "use lowercase letters, digits, '-' or '_'",
            ));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PlanKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A purchasable monthly plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub key: PlanKey,
    pub name: String,
    /// Monthly price in the currency's minor unit (paise, cents).
    pub amount: i64,
    /// ISO 4217 code.
    pub currency: String,
    pub audits_per_month: i32,
    pub features: Vec<String>,
}

/// Immutable plan table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCatalog {
    plans: BTreeMap<PlanKey, Plan>,
}

impl PlanCatalog {
    /// Builds a catalog, rejecting duplicate keys and non-positive prices or limits.
    pub fn new(plans: Vec<Plan>) -> Result<Self, ValidationError> {
        let mut table = BTreeMap::new();
        for plan in plans {
            if plan.amount <= 0 {
                return Err(ValidationError::invalid_format(
                    "amount",
                    format!("plan '{}' must have a positive price", plan.key),
                ));
            }
            if plan.audits_per_month <= 0 {
                return Err(ValidationError::invalid_format(
                    "auditsPerMonth",
                    format!("plan '{}' must allow at least one audit", plan.key),
                ));
            }
            if plan.key.as_str() == FREE_TIER {
                return Err(ValidationError::invalid_format(
                    "planType",
                    "'free' is reserved for unpaid profiles",
                ));
            }
            let key = plan.key.clone();
            if table.insert(key.clone(), plan).is_some() {
                return Err(ValidationError::invalid_format(
                    "planType",
                    format!("duplicate plan '{}'", key),
                ));
            }
        }
        Ok(Self { plans: table })
    }

    /// The catalog sold by the service.
    ///
    /// | Plan | Price (INR) | Audits / month |
    /// |------|-------------|----------------|
    /// | starter | 999 | 10 |
    /// | growth | 2,499 | 50 |
    /// | agency | 4,999 | 200 |
    pub fn standard() -> Self {
        let plan = |key: &str, name: &str, amount: i64, audits: i32, features: &[&str]| Plan {
            key: PlanKey(key.to_string()),
            name: name.to_string(),
            amount,
            currency: "INR".to_string(),
            audits_per_month: audits,
            features: features.iter().map(|f| f.to_string()).collect(),
        };

        let plans = [
            plan(
                "starter",
                "Starter",
                99_900,
                10,
                &["10 audits per month", "Performance and conversion scores", "Audit history"],
            ),
            plan(
                "growth",
                "Growth",
                249_900,
                50,
                &["50 audits per month", "Revenue impact estimates", "Priority support"],
            ),
            plan(
                "agency",
                "Agency",
                499_900,
                200,
                &["200 audits per month", "Multiple storefronts", "Dedicated support"],
            ),
        ];

        Self {
            plans: plans.into_iter().map(|p| (p.key.clone(), p)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Plan> {
        self.plans.get(key)
    }

    /// Looks up a plan, failing with `UnknownPlan` for keys not in the table.
    pub fn require(&self, key: &str) -> Result<&Plan, BillingError> {
        self.get(key).ok_or_else(|| BillingError::unknown_plan(key))
    }

    pub fn plans(&self) -> impl Iterator<Item = &Plan> {
        self.plans.values()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
