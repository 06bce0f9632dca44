use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::audit::AuditResult;
use crate::domain::foundation::{AuditId, DomainError, UserId};
use crate::ports::AuditRepository;

#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    results: RwLock<HashMap<AuditId, AuditResult>>,
}

impl InMemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.results.read().await.len()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn save(&self, result: &AuditResult) -> Result<(), DomainError> {
        self.results.write().await.insert(result.id, result.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &AuditId) -> Result<Option<AuditResult>, DomainError> {
        Ok(self.results.read().await.get(id).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<AuditResult>, DomainError> {
        let results = self.results.read().await;
        let mut mine: Vec<AuditResult> = results
            .values()
            .filter(|r| r.user_id.as_ref() == Some(user_id))
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(limit as usize);
        Ok(mine)
    }
}
