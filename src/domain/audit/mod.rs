//! Audit domain module.
//!
//! Requests, scored results, and the error taxonomy of the audit pipeline.
//!
//! # Module Structure
//!
//! - `request` - `AuditRequest`, `StoreUrl`, `AuditType`
//! - `result` - `AuditResult`, `AuditScores`, `Grade`
//! - `errors` - `AuditError`

mod errors;
mod request;
mod result;

pub use errors::AuditError;
pub use request::{AuditRequest, AuditType, StoreUrl};
pub use result::{AuditResult, AuditScores, AuditStatus, Grade};
