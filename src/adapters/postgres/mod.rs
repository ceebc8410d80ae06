//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresUserRepository` - subscribers with their inline subscription summary
//! - `PostgresSubscriptionRecordRepository` - subscription history
//! - `PostgresWebhookEventLog` - append-only webhook outcomes

mod subscription_record_repository;
mod user_repository;
mod webhook_event_log;

pub use subscription_record_repository::PostgresSubscriptionRecordRepository;
pub use user_repository::PostgresUserRepository;
pub use webhook_event_log::PostgresWebhookEventLog;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// Opens the connection pool and applies embedded migrations.
pub async fn connect(config: &DatabaseConfig, url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect(url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
