//! Audit repository port.
//!
//! Holds results for identified callers: the full payload plus summary
//! columns (score, grade, status) for querying.

use async_trait::async_trait;

use crate::domain::audit::AuditResult;
use crate::domain::foundation::{AuditId, DomainError, UserId};

#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persist a new result.
    ///
    /// # Errors
    ///
    /// `DatabaseError` on persistence failure. The caller must surface it.
    async fn save(&self, result: &AuditResult) -> Result<(), DomainError>;

    /// Find a result by id.
    async fn find_by_id(&self, id: &AuditId) -> Result<Option<AuditResult>, DomainError>;

    /// Most recent results for a user, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<AuditResult>, DomainError>;
}
