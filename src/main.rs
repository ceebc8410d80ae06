use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use trading_genie::adapters::http::{app_router, BillingAppState};
use trading_genie::adapters::in_memory::{
    InMemorySubscriptionRecordRepository, InMemoryUserRepository, InMemoryWebhookEventLog,
};
use trading_genie::adapters::postgres::{
    self, PostgresSubscriptionRecordRepository, PostgresUserRepository, PostgresWebhookEventLog,
};
use trading_genie::adapters::stripe::{StripeConfig, StripeGateway};
use trading_genie::adapters::telegram::{self, TelegramSender};
use trading_genie::config::AppConfig;
use trading_genie::domain::billing::PlanCatalog;
use trading_genie::ports::{SubscriptionRecordRepository, UserRepository, WebhookEventLog};

type Stores = (
    Arc<dyn UserRepository>,
    Arc<dyn SubscriptionRecordRepository>,
    Arc<dyn WebhookEventLog>,
);

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        // Configuration errors happen before the subscriber exists
        eprintln!("Trading Genie exited with error: {:#}", error);
        error!("Trading Genie exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config);
    config.validate().context("validating configuration")?;
    info!(environment = ?config.server.environment, "Configuration loaded");

    let (users, records, event_log) = open_stores(&config).await?;

    let payment = &config.payment;
    let stripe = StripeGateway::new(
        StripeConfig::new(
            SecretString::new(payment.stripe_api_key.clone()),
            SecretString::new(payment.stripe_webhook_secret.clone()),
        )
        .with_timeout(payment.timeout()),
    )?;
    if payment.is_live_mode() {
        info!("Stripe running in live mode");
    }

    let telegram = TelegramSender::new(
        telegram::TelegramConfig::new(SecretString::new(config.telegram.bot_token.clone()))
            .with_base_url(config.telegram.api_base_url.clone())
            .with_timeout(config.telegram.timeout()),
    )?;

    let state = BillingAppState {
        catalog: Arc::new(PlanCatalog::new(payment.plan_prices())),
        users,
        records,
        payment_gateway: Arc::new(stripe),
        notifier: Arc::new(telegram),
        event_log,
        frontend_url: config.server.frontend_url.clone(),
    };

    if config.server.admin_token().is_none() {
        warn!("No admin token configured; admin endpoints are unauthenticated");
    }

    let app = app_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("Trading Genie listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured level.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_stores(config: &AppConfig) -> Result<Stores> {
    match config.database.url() {
        Some(url) => {
            let pool = postgres::connect(&config.database, url)
                .await
                .context("connecting to PostgreSQL")?;
            info!("PostgreSQL connection established, migrations applied");

            let stores: Stores = (
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresSubscriptionRecordRepository::new(pool.clone())),
                Arc::new(PostgresWebhookEventLog::new(pool)),
            );
            Ok(stores)
        }
        None => {
            warn!("No database URL configured; subscriber data lives in memory only");
            let stores: Stores = (
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemorySubscriptionRecordRepository::new()),
                Arc::new(InMemoryWebhookEventLog::new()),
            );
            Ok(stores)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
