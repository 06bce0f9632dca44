//! PaymentEventDispatcher - routes verified provider events to the
//! subscription lifecycle.
//!
//! Anything that cannot be applied (unknown type, missing entity, no
//! matching row, impossible transition) comes back as
//! `WebhookError::Ignored` so the delivery is acknowledged and recorded.
//! Only storage failures surface as retryable errors.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::billing::{
    ProviderEvent, Subscription, SubscriptionRef, WebhookDispatcher, WebhookError,
    WebhookEventKind,
};

use super::SubscriptionLifecycle;

pub struct PaymentEventDispatcher {
    lifecycle: Arc<SubscriptionLifecycle>,
}

impl PaymentEventDispatcher {
    pub fn new(lifecycle: Arc<SubscriptionLifecycle>) -> Self {
        Self { lifecycle }
    }
}

fn matched(
    outcome: Option<Subscription>,
    event: &str,
    reference: &SubscriptionRef,
) -> Result<(), WebhookError> {
    match outcome {
        Some(_) => Ok(()),
        None => Err(WebhookError::Ignored(format!(
            "{}: no subscription matches {}",
            event, reference.provider_subscription_id
        ))),
    }
}

#[async_trait]
impl WebhookDispatcher for PaymentEventDispatcher {
    async fn dispatch(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        let kind = match event.kind() {
            Ok(kind) => kind,
            Err(WebhookError::MissingField(field)) => {
                return Err(WebhookError::Ignored(format!("{} without {}", event.event, field)));
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(event_type = %event.event, "Dispatching provider event");

        match kind {
            WebhookEventKind::PaymentCaptured { payment_id, order_id } => {
                self.lifecycle.activate(&order_id, &payment_id).await?;
                Ok(())
            }
            WebhookEventKind::PaymentFailed { payment_id, order_id } => {
                self.lifecycle
                    .record_payment_failure(&order_id, &payment_id)
                    .await?;
                Ok(())
            }
            WebhookEventKind::SubscriptionActivated(reference) => matched(
                self.lifecycle.provider_activated(&reference).await?,
                &event.event,
                &reference,
            ),
            WebhookEventKind::SubscriptionCancelled(reference) => matched(
                self.lifecycle.provider_cancelled(&reference).await?,
                &event.event,
                &reference,
            ),
            WebhookEventKind::SubscriptionPaused(reference) => matched(
                self.lifecycle.provider_paused(&reference).await?,
                &event.event,
                &reference,
            ),
            WebhookEventKind::SubscriptionResumed(reference) => matched(
                self.lifecycle.provider_resumed(&reference).await?,
                &event.event,
                &reference,
            ),
            WebhookEventKind::Unrecognized(event_type) => Err(WebhookError::Ignored(format!(
                "unhandled event type {}",
                event_type
            ))),
        }
    }
}
