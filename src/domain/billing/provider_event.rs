//! Webhook envelope sent by the payment provider.
//!
//! ```json
//! {
//!   "event": "payment.captured",
//!   "payload": {
//!     "payment": { "entity": { "id": "pay_123", "order_id": "order_456" } },
//!     "subscription": { "entity": { "id": "sub_789", "notes": { "user_id": "u-1" } } }
//!   },
//!   "created_at": 1700000000
//! }
//! ```
//!
//! Only the fields the dispatcher needs are typed; everything else is kept
//! by serializing the envelope back for the delivery record.

use serde::{Deserialize, Serialize};

use super::WebhookError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub event: String,
    #[serde(default)]
    pub payload: EventPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Wrapped<PaymentEntity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Wrapped<SubscriptionEntity>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wrapped<T> {
    pub entity: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub notes: EntityNotes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionEntity {
    pub id: String,
    #[serde(default)]
    pub notes: EntityNotes,
}

/// Free-form `notes` attached at creation time.
///
/// The provider sends `[]` rather than `{}` when no notes were set, so this
/// wraps raw JSON and reads keys only from objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityNotes(serde_json::Value);

impl EntityNotes {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .as_object()
            .and_then(|map| map.get(key))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get("user_id")
    }
}

/// Reference to a provider subscription plus whatever identity hint it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRef {
    pub provider_subscription_id: String,
    pub user_id: Option<String>,
}

/// Known event kinds. Anything else is `Unrecognized` and acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    PaymentCaptured { payment_id: String, order_id: String },
    PaymentFailed { payment_id: String, order_id: String },
    SubscriptionActivated(SubscriptionRef),
    SubscriptionCancelled(SubscriptionRef),
    SubscriptionPaused(SubscriptionRef),
    SubscriptionResumed(SubscriptionRef),
    Unrecognized(String),
}

impl WebhookEventKind {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, WebhookEventKind::Unrecognized(_))
    }
}

impl ProviderEvent {
    /// Classifies the event.
    ///
    /// # Errors
    ///
    /// `MissingField` when a recognized event lacks the entity it acts on.
    pub fn kind(&self) -> Result<WebhookEventKind, WebhookError> {
        match self.event.as_str() {
            "payment.captured" => {
                let (payment_id, order_id) = self.payment_refs()?;
                Ok(WebhookEventKind::PaymentCaptured { payment_id, order_id })
            }
            "payment.failed" => {
                let (payment_id, order_id) = self.payment_refs()?;
                Ok(WebhookEventKind::PaymentFailed { payment_id, order_id })
            }
            "subscription.activated" => Ok(WebhookEventKind::SubscriptionActivated(
                self.subscription_ref()?,
            )),
            "subscription.cancelled" => Ok(WebhookEventKind::SubscriptionCancelled(
                self.subscription_ref()?,
            )),
            "subscription.paused" => Ok(WebhookEventKind::SubscriptionPaused(
                self.subscription_ref()?,
            )),
            "subscription.resumed" => Ok(WebhookEventKind::SubscriptionResumed(
                self.subscription_ref()?,
            )),
            other => Ok(WebhookEventKind::Unrecognized(other.to_string())),
        }
    }

    fn payment_refs(&self) -> Result<(String, String), WebhookError> {
        let entity = &self
            .payload
            .payment
            .as_ref()
            .ok_or(WebhookError::MissingField("payload.payment"))?
            .entity;
        let order_id = entity
            .order_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or(WebhookError::MissingField("payload.payment.entity.order_id"))?;
        Ok((entity.id.clone(), order_id))
    }

    fn subscription_ref(&self) -> Result<SubscriptionRef, WebhookError> {
        let entity = &self
            .payload
            .subscription
            .as_ref()
            .ok_or(WebhookError::MissingField("payload.subscription"))?
            .entity;
        Ok(SubscriptionRef {
            provider_subscription_id: entity.id.clone(),
            user_id: entity.notes.user_id().map(str::to_string),
        })
    }
}
