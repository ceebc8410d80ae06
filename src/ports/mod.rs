//! Ports - Interfaces between the domain and the outside world.
//!
//! Each port is an async trait implemented by one or more adapters:
//!
//! - `PaymentGateway` - Stripe checkout, subscription lookup, webhook verification
//! - `NotificationSender` - Telegram messages
//! - `UserRepository` / `SubscriptionRecordRepository` - subscriber storage
//! - `WebhookEventLog` - append-only webhook outcome log

mod notification_sender;
mod payment_gateway;
mod subscription_record_repository;
mod user_repository;
mod webhook_event_log;

pub use notification_sender::{NotificationError, NotificationSender};
pub use payment_gateway::{
    CheckoutSession, CreateCheckoutRequest, GatewaySubscription, PaymentError, PaymentErrorCode,
    PaymentGateway,
};
pub use subscription_record_repository::SubscriptionRecordRepository;
pub use user_repository::UserRepository;
pub use webhook_event_log::{EventOutcome, WebhookEventEntry, WebhookEventLog};
