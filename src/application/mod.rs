//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers (checkout, webhook) write; query handlers back the admin API.

pub mod handlers;

pub use handlers::billing::{
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler, CreateCheckoutSessionResult,
    GetSubscriptionHistoryHandler, GetSubscriptionHistoryQuery, HandleStripeWebhookCommand,
    HandleStripeWebhookHandler, ListActiveSubscribersHandler, ListActiveSubscribersQuery,
    ListWebhookFailuresHandler, ListWebhookFailuresQuery, WebhookOutcome,
};
