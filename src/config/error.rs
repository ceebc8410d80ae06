//! Configuration errors

use thiserror::Error;

/// Environment could not be read into [`super::AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from the environment: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// A loaded value that the server refuses to start with.
///
/// `MissingRequired` carries the variable name without the
/// `TRADING_GENIE__` prefix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: TRADING_GENIE__{0}")]
    MissingRequired(&'static str),

    // Server
    #[error("Port must be non-zero")]
    InvalidPort,
    #[error("Timeout must be at least one second")]
    InvalidTimeout,
    #[error("Invalid listen address: {0}")]
    InvalidSocketAddr(String),
    #[error("Frontend URL must start with http:// or https://")]
    InvalidFrontendUrl,
    #[error("Frontend URL must use HTTPS in production")]
    FrontendUrlMustBeHttps,
    #[error("Admin token must be at least 16 characters in production")]
    AdminTokenTooShort,

    // Database
    #[error("Database URL must use the postgres:// or postgresql:// scheme")]
    InvalidDatabaseUrl,
    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,
    #[error("Pool max_connections exceeds {0}")]
    PoolSizeTooLarge(u32),

    // Stripe
    #[error("Stripe API key must start with sk_")]
    InvalidStripeKey,
    #[error("Stripe webhook secret must start with whsec_")]
    InvalidStripeWebhookSecret,

    // Telegram
    #[error("Telegram bot token must look like <bot id>:<secret>")]
    InvalidTelegramToken,
}
