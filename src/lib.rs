//! Trading Genie - Subscription backend for the Trading Genie landing page.
//!
//! Visitors pick a plan and pay through Stripe Checkout. Stripe webhooks are
//! reconciled into the subscriber store, and subscribers hear about every
//! lifecycle change through the Telegram bot.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
