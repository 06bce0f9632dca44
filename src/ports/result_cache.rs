//! Result cache port.
//!
//! Anonymous results live only here. An entry is visible for the cache's
//! TTL after insertion and absent afterwards, whether or not it has been
//! physically evicted yet.
//!
//! Implementations may be process-local: a result cached on one instance is
//! not visible from another.

use async_trait::async_trait;

use crate::domain::audit::AuditResult;
use crate::domain::foundation::{AuditId, DomainError};

#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Insert a result; the TTL starts now.
    async fn put(&self, result: AuditResult) -> Result<(), DomainError>;

    /// Look up a result. Expired entries are reported as `None`.
    async fn get(&self, id: &AuditId) -> Result<Option<AuditResult>, DomainError>;

    /// Drop expired entries, returning how many were removed.
    ///
    /// Only reclaims memory; lookups are correct without it.
    async fn purge_expired(&self) -> Result<usize, DomainError>;
}
