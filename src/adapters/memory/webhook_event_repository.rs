use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

#[derive(Debug, Default)]
pub struct InMemoryWebhookEventRepository {
    records: RwLock<HashMap<String, WebhookEventRecord>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.read().await.get(event_id).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.event_id) {
            Ok(SaveResult::AlreadyExists)
        } else {
            records.insert(record.event_id.clone(), record);
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !r.processed_at.is_before(&cutoff));
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn second_save_reports_existing() {
        let repo = InMemoryWebhookEventRepository::new();
        let record = WebhookEventRecord::success("evt_1", "payment.captured", json!({}), Timestamp::now());

        assert_eq!(repo.save(record.clone()).await.unwrap(), SaveResult::Inserted);
        assert_eq!(repo.save(record).await.unwrap(), SaveResult::AlreadyExists);
    }

    #[tokio::test]
    async fn delete_before_removes_old_records() {
        let repo = InMemoryWebhookEventRepository::new();
        let now = Timestamp::now();
        repo.save(WebhookEventRecord::success("old", "x", json!({}), now.add_days(-40)))
            .await
            .unwrap();
        repo.save(WebhookEventRecord::success("new", "x", json!({}), now))
            .await
            .unwrap();

        assert_eq!(repo.delete_before(now.add_days(-30)).await.unwrap(), 1);
        assert!(repo.find_by_event_id("old").await.unwrap().is_none());
        assert!(repo.find_by_event_id("new").await.unwrap().is_some());
    }
}
