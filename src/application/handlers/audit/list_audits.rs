//! ListAuditsHandler - Query handler for an identity's stored results.

use std::sync::Arc;

use crate::domain::audit::{AuditError, AuditResult};
use crate::domain::foundation::UserId;
use crate::ports::AuditRepository;

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
pub const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub struct ListAuditsQuery {
    pub user_id: UserId,
    pub limit: Option<u32>,
}

pub struct ListAuditsHandler {
    audits: Arc<dyn AuditRepository>,
}

impl ListAuditsHandler {
    pub fn new(audits: Arc<dyn AuditRepository>) -> Self {
        Self { audits }
    }

    /// Newest first, at most `MAX_HISTORY_LIMIT` entries.
    pub async fn handle(&self, query: ListAuditsQuery) -> Result<Vec<AuditResult>, AuditError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        Ok(self.audits.list_for_user(&query.user_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryAuditRepository;
    use crate::domain::audit::{AuditRequest, AuditScores, StoreUrl};
    use crate::domain::foundation::Timestamp;

    fn stored(user: &UserId, at: Timestamp) -> AuditResult {
        let request = AuditRequest::new(
            StoreUrl::parse("https://example.myshopify.com").unwrap(),
            Some(user.clone()),
        );
        AuditResult::completed(&request, AuditScores::new(50, 50, 0), at)
    }

    #[tokio::test]
    async fn lists_only_callers_results_newest_first() {
        let audits = Arc::new(InMemoryAuditRepository::new());
        let me = UserId::new("me").unwrap();
        let other = UserId::new("other").unwrap();
        let t0 = Timestamp::now();
        let older = stored(&me, t0);
        let newer = stored(&me, t0.add_days(1));
        audits.save(&older).await.unwrap();
        audits.save(&newer).await.unwrap();
        audits.save(&stored(&other, t0)).await.unwrap();

        let handler = ListAuditsHandler::new(audits);
        let listed = handler
            .handle(ListAuditsQuery { user_id: me, limit: None })
            .await
            .unwrap();

        assert_eq!(listed, vec![newer, older]);
    }

    #[tokio::test]
    async fn zero_limit_still_returns_one() {
        let audits = Arc::new(InMemoryAuditRepository::new());
        let me = UserId::new("me").unwrap();
        audits.save(&stored(&me, Timestamp::now())).await.unwrap();
        audits.save(&stored(&me, Timestamp::now())).await.unwrap();

        let listed = ListAuditsHandler::new(audits)
            .handle(ListAuditsQuery { user_id: me, limit: Some(0) })
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
    }
}
