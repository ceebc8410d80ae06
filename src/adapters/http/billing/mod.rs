//! HTTP adapter for billing endpoints.
//!
//! Exposes the billing application layer via REST API:
//! - `POST /api/create-checkout-session` - Start a Stripe checkout
//! - `POST /api/webhook` - Handle Stripe webhooks
//! - `GET /api/admin/subscribers` - Active subscribers with stats
//! - `GET /api/admin/subscription/:user_id` - Subscription history
//! - `GET /api/admin/webhook-failures` - Reconciliation report

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{BillingApiError, BillingAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::billing_router;
