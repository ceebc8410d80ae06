//! PostgreSQL implementation of SubscriptionRecordRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{SubscriptionChange, SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionRecordId, Timestamp, UserId};
use crate::ports::SubscriptionRecordRepository;

use super::user_repository::parse_plan;

pub struct PostgresSubscriptionRecordRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRecordRow {
    id: Uuid,
    user_id: Uuid,
    plan: String,
    status: String,
    stripe_subscription_id: String,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRecordRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRecordRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionRecord {
            id: SubscriptionRecordId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            plan: parse_plan(&row.plan)?,
            status: SubscriptionStatus::from_storage(&row.status),
            stripe_subscription_id: row.stripe_subscription_id,
            current_period_start: row.current_period_start.map(Timestamp::from_datetime),
            current_period_end: row.current_period_end.map(Timestamp::from_datetime),
            cancel_at_period_end: row.cancel_at_period_end,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl SubscriptionRecordRepository for PostgresSubscriptionRecordRepository {
    async fn create(&self, record: &SubscriptionRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscription_records (
                id, user_id, plan, status, stripe_subscription_id,
                current_period_start, current_period_end, cancel_at_period_end, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.as_uuid())
        .bind(record.plan.as_str())
        .bind(record.status.as_str())
        .bind(&record.stripe_subscription_id)
        .bind(record.current_period_start.map(|t| *t.as_datetime()))
        .bind(record.current_period_end.map(|t| *t.as_datetime()))
        .bind(record.cancel_at_period_end)
        .bind(record.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save subscription record", e))?;

        Ok(())
    }

    async fn count_for_subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM subscription_records WHERE stripe_subscription_id = $1",
        )
        .bind(stripe_subscription_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("count subscription records", e))?;

        Ok(count.max(0) as u64)
    }

    async fn apply_change(
        &self,
        stripe_subscription_id: &str,
        change: &SubscriptionChange,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscription_records SET
                status = $2,
                current_period_end = COALESCE($3, current_period_end),
                cancel_at_period_end = $4
            WHERE stripe_subscription_id = $1
            "#,
        )
        .bind(stripe_subscription_id)
        .bind(change.status.as_str())
        .bind(change.current_period_end.map(|t| *t.as_datetime()))
        .bind(change.cancel_at_period_end)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update subscription records", e))?;

        Ok(result.rows_affected())
    }

    async fn set_status(
        &self,
        stripe_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE subscription_records SET status = $2 WHERE stripe_subscription_id = $1",
        )
        .bind(stripe_subscription_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update subscription records", e))?;

        Ok(result.rows_affected())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SubscriptionRecord>, DomainError> {
        let rows: Vec<SubscriptionRecordRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, plan, status, stripe_subscription_id,
                   current_period_start, current_period_end, cancel_at_period_end, created_at
            FROM subscription_records
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list subscription records", e))?;

        rows.into_iter().map(SubscriptionRecord::try_from).collect()
    }
}
