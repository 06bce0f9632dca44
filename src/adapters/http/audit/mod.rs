//! HTTP adapter for audit endpoints.
//!
//! - `POST /api/audits` - Run an audit
//! - `GET /api/audits?id=` - Fetch a result
//! - `GET /api/audits/history` - List the caller's stored results

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{AuditApiError, AuditAppState};
pub use routes::audit_routes;
