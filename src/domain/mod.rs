//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, errors, state machine)
//! - `audit` - Audit requests, scored results, grade bands
//! - `billing` - Plans, entitlements, subscriptions, payments, webhooks

pub mod audit;
pub mod billing;
pub mod foundation;
