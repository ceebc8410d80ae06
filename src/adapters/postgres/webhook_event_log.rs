//! PostgreSQL implementation of WebhookEventLog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{EventOutcome, WebhookEventEntry, WebhookEventLog};

pub struct PostgresWebhookEventLog {
    pool: PgPool,
}

impl PostgresWebhookEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    id: Uuid,
    event_id: String,
    event_type: String,
    outcome: String,
    failures: serde_json::Value,
    redelivery: bool,
    recorded_at: DateTime<Utc>,
}

impl From<WebhookEventRow> for WebhookEventEntry {
    fn from(row: WebhookEventRow) -> Self {
        let failures = serde_json::from_value(row.failures).unwrap_or_default();
        WebhookEventEntry {
            id: row.id,
            event_id: row.event_id,
            event_type: row.event_type,
            outcome: EventOutcome::from_storage(&row.outcome),
            failures,
            redelivery: row.redelivery,
            recorded_at: Timestamp::from_datetime(row.recorded_at),
        }
    }
}

#[async_trait]
impl WebhookEventLog for PostgresWebhookEventLog {
    async fn append(&self, entry: WebhookEventEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_events (
                id, event_id, event_type, outcome, failures, redelivery, recorded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.event_id)
        .bind(&entry.event_type)
        .bind(entry.outcome.as_str())
        .bind(serde_json::json!(entry.failures))
        .bind(entry.redelivery)
        .bind(entry.recorded_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to append webhook event: {}", e),
            )
        })?;

        Ok(())
    }

    async fn deliveries_of(&self, event_id: &str) -> Result<u64, DomainError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM webhook_events WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to count webhook deliveries: {}", e),
                    )
                })?;

        Ok(count.max(0) as u64)
    }

    async fn recent_failures(&self, limit: u32) -> Result<Vec<WebhookEventEntry>, DomainError> {
        let rows: Vec<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT id, event_id, event_type, outcome, failures, redelivery, recorded_at
            FROM webhook_events
            WHERE outcome = 'failed' OR redelivery
            ORDER BY recorded_at DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list webhook failures: {}", e),
            )
        })?;

        Ok(rows.into_iter().map(WebhookEventEntry::from).collect())
    }
}
