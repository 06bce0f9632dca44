//! HandlePaymentWebhookHandler - Command handler for signed provider webhooks.
//!
//! 1. Verify the HMAC over the raw body (400 on failure, nothing parsed)
//! 2. Parse the envelope; unparseable bodies are acknowledged and dropped
//! 3. Hand the event to the idempotent processor under its delivery id

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::domain::billing::{IdempotentWebhookProcessor, WebhookError, WebhookSignatureVerifier};
use crate::ports::{Clock, WebhookResult};

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw webhook payload, exactly as received.
    pub payload: Vec<u8>,
    /// Signature header, if present.
    pub signature: Option<String>,
    /// Provider delivery id header, if present.
    pub delivery_id: Option<String>,
}

pub struct HandlePaymentWebhookHandler {
    verifier: WebhookSignatureVerifier,
    processor: IdempotentWebhookProcessor,
    clock: Arc<dyn Clock>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: WebhookSignatureVerifier,
        processor: IdempotentWebhookProcessor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier,
            processor,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<WebhookResult, WebhookError> {
        let event = match self
            .verifier
            .verify_and_parse(&cmd.payload, cmd.signature.as_deref())
        {
            Ok(event) => event,
            Err(WebhookError::ParseError(reason)) => {
                tracing::info!(reason = %reason, "Acknowledging unparseable webhook body");
                return Ok(WebhookResult::Ignored(reason));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Webhook rejected");
                return Err(e);
            }
        };

        let delivery_id = delivery_id(cmd.delivery_id.as_deref(), &cmd.payload);
        let result = self
            .processor
            .process(&delivery_id, &event, self.clock.now())
            .await;

        match &result {
            Ok(WebhookResult::Ignored(reason)) => {
                tracing::info!(delivery_id = %delivery_id, event_type = %event.event, reason = %reason, "Webhook ignored");
            }
            Ok(outcome) => {
                tracing::info!(delivery_id = %delivery_id, event_type = %event.event, outcome = outcome.as_str(), "Webhook handled");
            }
            Err(e) => {
                tracing::error!(delivery_id = %delivery_id, event_type = %event.event, error = %e, "Webhook processing failed");
            }
        }
        result
    }
}

/// Provider delivery id when sent, otherwise the SHA-256 of the body.
fn delivery_id(header: Option<&str>, payload: &[u8]) -> String {
    match header.map(str::trim).filter(|h| !h.is_empty()) {
        Some(id) => id.to_string(),
        None => hex::encode(Sha256::digest(payload)),
    }
}
