//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `analysis` - Storefront fetch and scoring heuristics (`AuditEngine`)
//! - `auth` - JWT and mock session validators
//! - `cache` - In-memory TTL result cache
//! - `clock` - System and manual clocks
//! - `http` - axum routers, DTOs, middleware
//! - `memory` - In-memory repositories for tests and local runs
//! - `postgres` - sqlx repositories
//! - `razorpay` - Payment gateway client and mock

pub mod analysis;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod razorpay;

pub use cache::InMemoryResultCache;
pub use clock::{ManualClock, SystemClock};
