//! Storefront analysis adapter.
//!
//! `HttpAuditEngine` fetches the storefront once and hands the page to
//! pure scoring heuristics, which are tested without the network.
//! `MockAuditEngine` returns scripted scores for tests.

mod heuristics;
mod http_engine;
mod mock;

pub use heuristics::{score_page, PageSignals};
pub use http_engine::{HttpAuditEngine, HttpAuditEngineConfig};
pub use mock::MockAuditEngine;
