//! In-memory repositories.
//!
//! Used by tests and for running the service without a database. Each
//! repository guards its map with one lock, which makes the profile
//! check-and-increment atomic just like the SQL conditional update.

mod audit_repository;
mod payment_repository;
mod profile_repository;
mod subscription_repository;
mod webhook_event_repository;

pub use audit_repository::InMemoryAuditRepository;
pub use payment_repository::InMemoryPaymentRepository;
pub use profile_repository::InMemoryProfileRepository;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
