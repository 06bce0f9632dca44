//! VerifyPaymentHandler - Command handler for the checkout callback.
//!
//! The browser reports `orderId`, `paymentId` and a signature over
//! `orderId|paymentId`. A valid signature proves the provider captured the
//! payment, so the plan is activated without waiting for the webhook.

use std::sync::Arc;

use crate::domain::billing::{BillingError, PaymentSignatureVerifier, Subscription};
use crate::domain::foundation::UserId;
use crate::ports::PaymentRepository;

use super::SubscriptionLifecycle;

#[derive(Debug, Clone)]
pub struct VerifyPaymentCommand {
    pub user_id: UserId,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub plan_type: String,
}

pub struct VerifyPaymentHandler {
    verifier: PaymentSignatureVerifier,
    payments: Arc<dyn PaymentRepository>,
    lifecycle: Arc<SubscriptionLifecycle>,
}

impl VerifyPaymentHandler {
    pub fn new(
        verifier: PaymentSignatureVerifier,
        payments: Arc<dyn PaymentRepository>,
        lifecycle: Arc<SubscriptionLifecycle>,
    ) -> Self {
        Self {
            verifier,
            payments,
            lifecycle,
        }
    }

    pub async fn handle(&self, cmd: VerifyPaymentCommand) -> Result<Subscription, BillingError> {
        // 1. Required fields
        let order_id = required("orderId", &cmd.order_id)?;
        let payment_id = required("paymentId", &cmd.payment_id)?;
        let signature = required("signature", &cmd.signature)?;
        let plan_type = required("planType", &cmd.plan_type)?;

        // 2. Signature over orderId|paymentId
        if let Err(e) = self.verifier.verify(order_id, payment_id, signature) {
            tracing::warn!(user_id = %cmd.user_id, order_id, "Payment signature mismatch");
            return Err(e);
        }

        // 3. The order must belong to the caller and match the plan
        let payment = self
            .payments
            .find_by_order_id(order_id)
            .await?
            .filter(|p| p.user_id == cmd.user_id)
            .ok_or_else(|| BillingError::payment_not_found(order_id))?;

        if payment.plan_key.as_str() != plan_type {
            return Err(BillingError::plan_mismatch(payment.plan_key.as_str(), plan_type));
        }

        // 4. Shared activation path
        self.lifecycle.activate(order_id, payment_id).await
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, BillingError> {
    let value = value.trim();
    if value.is_empty() {
        Err(BillingError::missing_field(field))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{user, BillingFixture};
    use super::*;
    use crate::domain::billing::sign_payload;

    const KEY_SECRET: &str = "rzp_test_secret";

    fn handler(f: &BillingFixture) -> VerifyPaymentHandler {
        VerifyPaymentHandler::new(
            PaymentSignatureVerifier::new(KEY_SECRET),
            f.payments.clone(),
            f.lifecycle.clone(),
        )
    }

    fn command(order: &str, payment: &str, plan: &str) -> VerifyPaymentCommand {
        VerifyPaymentCommand {
            user_id: user("alice"),
            order_id: order.to_string(),
            payment_id: payment.to_string(),
            signature: sign_payload(KEY_SECRET, format!("{}|{}", order, payment).as_bytes()),
            plan_type: plan.to_string(),
        }
    }

    #[tokio::test]
    async fn valid_signature_activates_plan() {
        let f = BillingFixture::new();
        f.seed_order(&user("alice"), "starter", "order_1").await;

        let subscription = handler(&f).handle(command("order_1", "pay_1", "starter")).await.unwrap();

        assert!(subscription.is_active());
        assert_eq!(subscription.audits_per_month, 10);
    }

    #[tokio::test]
    async fn reverify_returns_same_subscription() {
        let f = BillingFixture::new();
        f.seed_order(&user("alice"), "starter", "order_1").await;
        let handler = handler(&f);

        let first = handler.handle(command("order_1", "pay_1", "starter")).await.unwrap();
        let second = handler.handle(command("order_1", "pay_1", "starter")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(f.subscriptions.history(&user("alice")).await.len(), 1);
    }

    #[tokio::test]
    async fn bad_signature_changes_nothing() {
        let f = BillingFixture::new();
        f.seed_order(&user("alice"), "starter", "order_1").await;
        let mut cmd = command("order_1", "pay_1", "starter");
        cmd.signature = sign_payload("wrong", b"order_1|pay_1");

        let err = handler(&f).handle(cmd).await.unwrap_err();

        assert_eq!(err, BillingError::InvalidPaymentSignature);
        assert!(f.subscriptions.history(&user("alice")).await.is_empty());
    }

    #[tokio::test]
    async fn plan_must_match_order() {
        let f = BillingFixture::new();
        f.seed_order(&user("alice"), "starter", "order_1").await;

        let err = handler(&f)
            .handle(command("order_1", "pay_1", "agency"))
            .await
            .unwrap_err();

        assert_eq!(err, BillingError::plan_mismatch("starter", "agency"));
    }

    #[tokio::test]
    async fn someone_elses_order_is_not_found() {
        let f = BillingFixture::new();
        f.seed_order(&user("bob"), "starter", "order_1").await;

        let err = handler(&f)
            .handle(command("order_1", "pay_1", "starter"))
            .await
            .unwrap_err();

        assert_eq!(err, BillingError::payment_not_found("order_1"));
    }

    #[tokio::test]
    async fn missing_fields_are_reported() {
        let f = BillingFixture::new();
        let mut cmd = command("order_1", "pay_1", "starter");
        cmd.payment_id = String::new();

        let err = handler(&f).handle(cmd).await.unwrap_err();

        assert_eq!(err, BillingError::missing_field("paymentId"));
    }
}
