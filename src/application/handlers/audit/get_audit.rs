//! GetAuditHandler - Query handler for a single audit result.
//!
//! Anonymous ids only ever live in the cache, so the cache is consulted
//! first and storage only on a miss.

use std::sync::Arc;

use crate::domain::audit::{AuditError, AuditResult};
use crate::domain::foundation::AuditId;
use crate::ports::{AuditRepository, ResultCache};

#[derive(Debug, Clone)]
pub struct GetAuditQuery {
    pub id: AuditId,
}

pub struct GetAuditHandler {
    cache: Arc<dyn ResultCache>,
    audits: Arc<dyn AuditRepository>,
}

impl GetAuditHandler {
    pub fn new(cache: Arc<dyn ResultCache>, audits: Arc<dyn AuditRepository>) -> Self {
        Self { cache, audits }
    }

    pub async fn handle(&self, query: GetAuditQuery) -> Result<AuditResult, AuditError> {
        if let Some(result) = self.cache.get(&query.id).await? {
            return Ok(result);
        }

        self.audits
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| AuditError::not_found(query.id))
    }
}
