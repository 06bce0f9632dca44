//! Webhook event repository port - delivery de-duplication.
//!
//! The provider delivers at least once: timeouts, 5xx responses and lost
//! acknowledgements all cause redelivery. Recording each applied delivery
//! id lets the processor skip copies.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};

/// Record of a handled delivery.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Delivery id (`x-event-id` header, or a digest of the body).
    pub event_id: String,

    /// Event type string (e.g. "payment.captured").
    pub event_type: String,

    pub processed_at: Timestamp,

    /// "success" or "ignored".
    pub result: String,

    /// Why the event was ignored.
    pub error_message: Option<String>,

    /// Event envelope, for debugging.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    pub fn success(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
        processed_at: Timestamp,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at,
            result: "success".to_string(),
            error_message: None,
            payload,
        }
    }

    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
        processed_at: Timestamp,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at,
            result: "ignored".to_string(),
            error_message: Some(reason.into()),
            payload,
        }
    }
}

/// Result of attempting to save a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First time seeing this delivery.
    Inserted,
    /// Another worker recorded it first.
    AlreadyExists,
}

/// Port for storing handled deliveries.
///
/// Implementations should use a unique constraint on `event_id` so
/// concurrent copies resolve to one `Inserted`.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Insert with `ON CONFLICT DO NOTHING` semantics.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Delete records processed before `cutoff`; returns how many.
    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}

/// Outcome of processing a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookResult {
    /// State was updated.
    Processed,
    /// Acknowledged without changes.
    Ignored(String),
    /// Duplicate delivery, skipped.
    AlreadyProcessed,
}

impl WebhookResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookResult::Processed => "processed",
            WebhookResult::Ignored(_) => "ignored",
            WebhookResult::AlreadyProcessed => "duplicate",
        }
    }
}
