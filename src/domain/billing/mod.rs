//! Billing domain module.
//!
//! Plans, subscribers, subscription records, and the Stripe webhook
//! vocabulary used to reconcile them.
//!
//! # Module Structure
//!
//! - `plan` / `plan_catalog` - Purchasable plans and their Stripe prices
//! - `status` - Subscription lifecycle status
//! - `user` / `subscription_record` - Stored entities
//! - `stripe_event` / `webhook_verifier` - Inbound webhook handling
//! - `notifications` - Telegram message texts

mod errors;
mod notifications;
mod plan;
mod plan_catalog;
mod status;
mod stripe_event;
mod subscription_record;
mod user;
mod webhook_errors;
mod webhook_verifier;

pub use errors::BillingError;
pub use notifications::{cancellation_message, payment_failed_message, welcome_message};
pub use plan::{PlanTag, UnknownPlanTag};
pub use plan_catalog::{PlanCatalog, PlanDefinition, PlanPrices};
pub use status::SubscriptionStatus;
pub use stripe_event::{
    CheckoutSessionObject, InvoiceObject, StripeEvent, StripeEventData, StripeEventType,
    SubscriptionObject,
};
pub use subscription_record::{SubscriptionChange, SubscriptionRecord};
pub use user::{NewUser, SubscriptionSummary, User};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{sign_payload, SignatureHeader, StripeWebhookVerifier, MAX_EVENT_AGE_SECS};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
