//! Razorpay payment gateway adapter.
//!
//! Only order creation goes over the REST API. Payment and webhook
//! signatures are verified in the billing domain with the same secrets.
//!
//! # Configuration
//!
//! - `payment.key_id`: public key id, also returned to the checkout widget
//! - `payment.key_secret`: API secret, used for basic auth and payment signatures
//! - `payment.webhook_secret`: webhook signing secret

mod gateway;
mod mock;

pub use gateway::{RazorpayConfig, RazorpayGateway};
pub use mock::MockPaymentGateway;
