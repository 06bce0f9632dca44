//! Storefront Audit - entitlement-gated storefront audits with paid plans.
//!
//! Anonymous callers get short-lived cached results; signed-in callers spend
//! quota from their plan and keep a durable audit history. Plans are bought
//! through a payment provider whose webhooks keep subscriptions in sync.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
