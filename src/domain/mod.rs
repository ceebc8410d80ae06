//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `billing` - Plans, subscribers, subscriptions, and Stripe webhooks

pub mod billing;
pub mod foundation;
