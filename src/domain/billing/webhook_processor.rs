//! Webhook processor - applies each provider delivery at most once.
//!
//! 1. Skip deliveries whose id is already recorded
//! 2. Dispatch to the state machine
//! 3. Record applied and ignored deliveries
//!
//! Failed deliveries are not recorded, so the provider's retry runs them
//! again. When two copies race, the first insert wins and the other reports
//! `AlreadyProcessed`; every transition writes an absolute target state, so
//! the loser's work is harmless.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult};

use super::{ProviderEvent, WebhookError};

/// Applies a verified event.
///
/// Returns `Err(WebhookError::Ignored(_))` for events that are acknowledged
/// but change nothing.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    async fn dispatch(&self, event: &ProviderEvent) -> Result<(), WebhookError>;
}

pub struct IdempotentWebhookProcessor {
    repository: Arc<dyn WebhookEventRepository>,
    dispatcher: Arc<dyn WebhookDispatcher>,
}

impl IdempotentWebhookProcessor {
    pub fn new(
        repository: Arc<dyn WebhookEventRepository>,
        dispatcher: Arc<dyn WebhookDispatcher>,
    ) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Process one delivery.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Processed)` - state was updated
    /// - `Ok(WebhookResult::Ignored(_))` - acknowledged, nothing to do
    /// - `Ok(WebhookResult::AlreadyProcessed)` - duplicate delivery
    /// - `Err(_)` - retryable failure, nothing recorded
    pub async fn process(
        &self,
        delivery_id: &str,
        event: &ProviderEvent,
        received_at: Timestamp,
    ) -> Result<WebhookResult, WebhookError> {
        if self.repository.find_by_event_id(delivery_id).await?.is_some() {
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let outcome = self.dispatcher.dispatch(event).await;

        let payload = serde_json::to_value(event)
            .map_err(|e| WebhookError::ParseError(format!("Failed to serialize event: {}", e)))?;

        let (record, result) = match outcome {
            Ok(()) => (
                WebhookEventRecord::success(delivery_id, &event.event, payload, received_at),
                WebhookResult::Processed,
            ),
            Err(WebhookError::Ignored(reason)) => (
                WebhookEventRecord::ignored(delivery_id, &event.event, &reason, payload, received_at),
                WebhookResult::Ignored(reason),
            ),
            Err(e) => return Err(e),
        };

        match self.repository.save(record).await? {
            SaveResult::Inserted => Ok(result),
            SaveResult::AlreadyExists => Ok(WebhookResult::AlreadyProcessed),
        }
    }
}
