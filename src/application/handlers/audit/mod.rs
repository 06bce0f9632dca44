//! Audit handlers.
//!
//! ## Commands
//! - Running an audit behind the entitlement gate
//!
//! ## Queries
//! - Fetching a result by id (cache first, then storage)
//! - Listing an identity's stored results

mod get_audit;
mod list_audits;
mod run_audit;

// Commands
pub use run_audit::{RunAuditCommand, RunAuditHandler};

// Queries
pub use get_audit::{GetAuditHandler, GetAuditQuery};
pub use list_audits::{ListAuditsHandler, ListAuditsQuery, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
