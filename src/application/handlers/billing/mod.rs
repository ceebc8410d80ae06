//! Billing handlers.
//!
//! ## Commands
//! - Starting a Stripe checkout for a plan
//! - Reconciling Stripe webhook deliveries
//!
//! ## Queries
//! - Active subscribers with plan breakdown (admin)
//! - Subscription history for one user (admin)
//! - Failed or redelivered webhook events (admin)

mod create_checkout_session;
mod get_subscription_history;
mod handle_stripe_webhook;
mod list_active_subscribers;
mod list_webhook_failures;

// Commands
pub use create_checkout_session::{
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler, CreateCheckoutSessionResult,
    METADATA_PLAN, METADATA_TELEGRAM_CHAT_ID, METADATA_TELEGRAM_USERNAME, METADATA_USER_ID,
};
pub use handle_stripe_webhook::{
    HandleStripeWebhookCommand, HandleStripeWebhookHandler, WebhookOutcome,
};

// Queries
pub use get_subscription_history::{
    GetSubscriptionHistoryHandler, GetSubscriptionHistoryQuery, GetSubscriptionHistoryResult,
};
pub use list_active_subscribers::{
    ListActiveSubscribersHandler, ListActiveSubscribersQuery, ListActiveSubscribersResult,
    PlanBreakdown, SubscriberStats,
};
pub use list_webhook_failures::{
    ListWebhookFailuresHandler, ListWebhookFailuresQuery, ListWebhookFailuresResult,
    DEFAULT_FAILURE_LIMIT, MAX_FAILURE_LIMIT,
};
