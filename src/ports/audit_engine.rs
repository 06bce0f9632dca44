//! Audit engine port.
//!
//! The engine turns a storefront into sub-scores. How it scores is its own
//! business; the pipeline only needs a complete `AuditScores` or an error.

use async_trait::async_trait;

use crate::domain::audit::{AuditScores, StoreUrl};
use crate::domain::foundation::DomainError;

#[async_trait]
pub trait AuditEngine: Send + Sync {
    /// Scores the storefront.
    ///
    /// # Errors
    ///
    /// `AuditEngineError` when the store cannot be analysed. Partial scores
    /// are never returned.
    async fn analyze(&self, store_url: &StoreUrl) -> Result<AuditScores, DomainError>;
}
