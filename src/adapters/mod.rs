//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum routes, DTOs and middleware
//! - `in_memory` - Process-local repositories
//! - `postgres` - PostgreSQL repositories
//! - `stripe` - Stripe payment gateway
//! - `telegram` - Telegram notification sender

pub mod http;
pub mod in_memory;
pub mod postgres;
pub mod stripe;
pub mod telegram;
