//! In-memory adapters.
//!
//! Used when no database URL is configured and by the test suites.

mod subscription_record_repository;
mod user_repository;
mod webhook_event_log;

pub use subscription_record_repository::InMemorySubscriptionRecordRepository;
pub use user_repository::InMemoryUserRepository;
pub use webhook_event_log::InMemoryWebhookEventLog;
