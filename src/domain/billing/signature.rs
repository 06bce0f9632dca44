//! Payment provider signature schemes.
//!
//! Two schemes share the HMAC-SHA256 primitive but never their inputs:
//!
//! - **Webhook body**: hex HMAC of the exact raw request body, sent in the
//!   `x-signature` header, keyed with the webhook secret.
//! - **Checkout payment**: hex HMAC of `"{order_id}|{payment_id}"`, returned
//!   to the browser by the checkout widget, keyed with the API key secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::provider_event::ProviderEvent;
use super::webhook_errors::WebhookError;
use super::BillingError;

type HmacSha256 = Hmac<Sha256>;

/// Verifier for webhook deliveries.
pub struct WebhookSignatureVerifier {
    secret: String,
}

impl WebhookSignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Checks the claimed signature against the raw body.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` - header absent or blank
    /// - `InvalidSignature` - anything but the lowercase hex digest
    pub fn verify(&self, payload: &[u8], signature_header: Option<&str>) -> Result<(), WebhookError> {
        let claimed = signature_header
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::MissingSignature)?;

        let expected = hmac_sha256(&self.secret, payload).ok_or(WebhookError::InvalidSignature)?;

        if !matches_hex_digest(&expected, claimed) {
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    /// Verifies, then parses the body as a provider event.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<ProviderEvent, WebhookError> {
        self.verify(payload, signature_header)?;
        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

/// Verifier for the checkout `orderId|paymentId` signature.
pub struct PaymentSignatureVerifier {
    secret: String,
}

impl PaymentSignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<(), BillingError> {
        let message = format!("{}|{}", order_id, payment_id);
        let expected = hmac_sha256(&self.secret, message.as_bytes())
            .ok_or(BillingError::InvalidPaymentSignature)?;

        if matches_hex_digest(&expected, signature.trim()) {
            Ok(())
        } else {
            Err(BillingError::InvalidPaymentSignature)
        }
    }
}

/// Hex HMAC-SHA256 of `payload` under `secret`.
///
/// Used by tests and local tooling to produce signatures the verifiers accept.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    hmac_sha256(secret, payload).map(hex::encode).unwrap_or_default()
}

fn hmac_sha256(secret: &str, payload: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Constant-time check of a claimed signature against the lowercase hex
/// encoding of `expected`. Any other spelling of the digest is a mismatch.
fn matches_hex_digest(expected: &[u8], claimed: &str) -> bool {
    let expected = hex::encode(expected);
    if expected.len() != claimed.len() {
        return false;
    }
    expected.as_bytes().ct_eq(claimed.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";
    const BODY: &[u8] = br#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1","order_id":"order_1"}}}}"#;

    fn verifier() -> WebhookSignatureVerifier {
        WebhookSignatureVerifier::new(TEST_SECRET)
    }

    // ══════════════════════════════════════════════════════════════
    // Webhook body signature
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn identical_body_verifies() {
        let sig = sign_payload(TEST_SECRET, BODY);
        assert!(verifier().verify(BODY, Some(&sig)).is_ok());
    }

    #[test]
    fn surrounding_whitespace_in_header_is_tolerated() {
        let sig = format!("  {}\n", sign_payload(TEST_SECRET, BODY));
        assert!(verifier().verify(BODY, Some(&sig)).is_ok());
    }

    #[test]
    fn missing_or_blank_header_is_rejected() {
        assert!(matches!(verifier().verify(BODY, None), Err(WebhookError::MissingSignature)));
        assert!(matches!(verifier().verify(BODY, Some("  ")), Err(WebhookError::MissingSignature)));
    }

    #[test]
    fn non_hex_signature_is_invalid() {
        assert!(matches!(
            verifier().verify(BODY, Some("not-hex")),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let sig = sign_payload("other-secret", BODY);
        assert!(matches!(
            verifier().verify(BODY, Some(&sig)),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn truncated_signature_is_invalid() {
        let sig = sign_payload(TEST_SECRET, BODY);
        assert!(verifier().verify(BODY, Some(&sig[..32])).is_err());
    }

    #[test]
    fn verify_and_parse_returns_event() {
        let sig = sign_payload(TEST_SECRET, BODY);
        let event = verifier().verify_and_parse(BODY, Some(&sig)).unwrap();
        assert_eq!(event.event, "payment.captured");
    }

    #[test]
    fn verify_and_parse_checks_signature_before_parsing() {
        let garbage = b"not json";
        assert!(matches!(
            verifier().verify_and_parse(garbage, Some("00")),
            Err(WebhookError::InvalidSignature)
        ));

        let sig = sign_payload(TEST_SECRET, garbage);
        assert!(matches!(
            verifier().verify_and_parse(garbage, Some(&sig)),
            Err(WebhookError::ParseError(_))
        ));
    }

    proptest! {
        #[test]
        fn any_single_byte_change_to_body_fails(idx in 0usize..BODY.len(), flip in 1u8..=255) {
            let sig = sign_payload(TEST_SECRET, BODY);
            let mut tampered = BODY.to_vec();
            tampered[idx] ^= flip;
            prop_assert!(verifier().verify(&tampered, Some(&sig)).is_err());
        }

        #[test]
        fn any_single_byte_change_to_signature_fails(idx in 0usize..32, flip in 1u8..=255) {
            let mut raw = hex::decode(sign_payload(TEST_SECRET, BODY)).unwrap();
            raw[idx] ^= flip;
            let sig = hex::encode(raw);
            prop_assert!(verifier().verify(BODY, Some(&sig)).is_err());
        }

        #[test]
        fn any_single_character_change_to_header_fails(idx in 0usize..64, replacement in any::<char>()) {
            let sig = sign_payload(TEST_SECRET, BODY);
            let original = sig.as_bytes()[idx] as char;
            prop_assume!(replacement != original);

            let mut header: Vec<char> = sig.chars().collect();
            header[idx] = replacement;
            let header: String = header.into_iter().collect();
            prop_assert!(verifier().verify(BODY, Some(&header)).is_err());
        }

        #[test]
        fn any_single_character_change_to_payment_signature_fails(idx in 0usize..64, replacement in any::<char>()) {
            let sig = sign_payload(KEY_SECRET, b"order_1|pay_1");
            let original = sig.as_bytes()[idx] as char;
            prop_assume!(replacement != original);

            let mut tampered: Vec<char> = sig.chars().collect();
            tampered[idx] = replacement;
            let tampered: String = tampered.into_iter().collect();
            let verifier = PaymentSignatureVerifier::new(KEY_SECRET);
            prop_assert!(verifier.verify("order_1", "pay_1", &tampered).is_err());
        }
    }

    #[test]
    fn uppercased_hex_digit_in_header_is_invalid() {
        let sig = sign_payload(TEST_SECRET, BODY);
        let idx = sig.find(|c: char| c.is_ascii_alphabetic()).unwrap();
        let mut header = sig.clone();
        header.replace_range(idx..idx + 1, &sig[idx..idx + 1].to_ascii_uppercase());

        assert!(matches!(
            verifier().verify(BODY, Some(&header)),
            Err(WebhookError::InvalidSignature)
        ));
        assert!(verifier().verify(BODY, Some(&header.to_ascii_uppercase())).is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // Checkout payment signature
    // ══════════════════════════════════════════════════════════════

    const KEY_SECRET: &str = "rzp_test_key_secret";

    #[test]
    fn payment_signature_over_order_and_payment_verifies() {
        let sig = sign_payload(KEY_SECRET, b"order_1|pay_1");
        let verifier = PaymentSignatureVerifier::new(KEY_SECRET);
        assert!(verifier.verify("order_1", "pay_1", &sig).is_ok());
    }

    #[test]
    fn payment_signature_is_order_sensitive() {
        let sig = sign_payload(KEY_SECRET, b"order_1|pay_1");
        let verifier = PaymentSignatureVerifier::new(KEY_SECRET);
        assert_eq!(
            verifier.verify("pay_1", "order_1", &sig),
            Err(BillingError::InvalidPaymentSignature)
        );
        assert!(verifier.verify("order_2", "pay_1", &sig).is_err());
    }

    #[test]
    fn schemes_are_not_interchangeable() {
        // A body signature over the same bytes must not pass as a payment signature
        // under a different secret family.
        let body_sig = sign_payload(TEST_SECRET, b"order_1|pay_1");
        let verifier = PaymentSignatureVerifier::new(KEY_SECRET);
        assert!(verifier.verify("order_1", "pay_1", &body_sig).is_err());
    }
}
