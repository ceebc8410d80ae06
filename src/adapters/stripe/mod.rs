//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port for Stripe integration, including:
//! - Hosted checkout sessions
//! - Subscription retrieval
//! - Webhook signature verification
//!
//! # Configuration
//!
//! Required environment variables:
//! - `TRADING_GENIE__PAYMENT__STRIPE_API_KEY`: Stripe secret API key
//! - `TRADING_GENIE__PAYMENT__STRIPE_WEBHOOK_SECRET`: Webhook signing secret (whsec_...)

mod api_types;
mod mock_payment_gateway;
mod stripe_gateway;

pub use api_types::{StripeCheckoutSession, StripeErrorBody, StripeErrorResponse, StripeSubscription};
pub use mock_payment_gateway::{GatewayCall, MockPaymentGateway};
pub use stripe_gateway::{StripeConfig, StripeGateway};
