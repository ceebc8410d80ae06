//! PostgreSQL implementation of UserRepository.
//!
//! The subscription summary is stored inline on the `users` row as a set of
//! nullable `subscription_*` columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{NewUser, PlanTag, SubscriptionStatus, SubscriptionSummary, User};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::UserRepository;

const USER_COLUMNS: &str = r#"
    id, email, telegram_username, telegram_chat_id,
    subscription_plan, subscription_status, subscription_stripe_customer_id,
    subscription_stripe_subscription_id, subscription_current_period_end,
    subscription_created_at, created_at
"#;

/// PostgreSQL implementation of the UserRepository port.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    telegram_username: String,
    telegram_chat_id: String,
    subscription_plan: Option<String>,
    subscription_status: Option<String>,
    subscription_stripe_customer_id: Option<String>,
    subscription_stripe_subscription_id: Option<String>,
    subscription_current_period_end: Option<DateTime<Utc>>,
    subscription_created_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let subscription = match (
            row.subscription_plan,
            row.subscription_status,
            row.subscription_stripe_subscription_id,
        ) {
            (Some(plan), Some(status), Some(stripe_subscription_id)) => Some(SubscriptionSummary {
                plan: parse_plan(&plan)?,
                status: SubscriptionStatus::from_storage(&status),
                stripe_customer_id: row.subscription_stripe_customer_id,
                stripe_subscription_id,
                current_period_end: row
                    .subscription_current_period_end
                    .map(Timestamp::from_datetime),
                created_at: Timestamp::from_datetime(
                    row.subscription_created_at.unwrap_or(row.created_at),
                ),
            }),
            _ => None,
        };

        Ok(User {
            id: UserId::from_uuid(row.id),
            email: row.email,
            telegram_username: row.telegram_username,
            telegram_chat_id: row.telegram_chat_id,
            subscription,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

pub(super) fn parse_plan(s: &str) -> Result<PlanTag, DomainError> {
    s.parse::<PlanTag>().map_err(|_| {
        DomainError::new(ErrorCode::DatabaseError, format!("Invalid plan value: {}", s))
    })
}

fn user_not_found(id: &UserId) -> DomainError {
    DomainError::new(ErrorCode::UserNotFound, format!("User not found: {}", id))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn upsert_by_email(&self, new_user: NewUser) -> Result<User, DomainError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let query = format!(
            r#"
            INSERT INTO users (id, email, telegram_username, telegram_chat_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row: UserRow = sqlx::query_as(&query)
            .bind(Uuid::new_v4())
            .bind(&new_user.email)
            .bind(&new_user.telegram_username)
            .bind(&new_user.telegram_chat_id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to upsert user: {}", e))
            })?;

        User::try_from(row)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to find user: {}", e))
            })?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<User>, DomainError> {
        let query = format!(
            "SELECT {} FROM users WHERE subscription_stripe_subscription_id = $1 LIMIT 1",
            USER_COLUMNS
        );

        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(stripe_subscription_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to find user: {}", e))
            })?;

        row.map(User::try_from).transpose()
    }

    async fn set_subscription(
        &self,
        id: &UserId,
        summary: SubscriptionSummary,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                subscription_plan = $2,
                subscription_status = $3,
                subscription_stripe_customer_id = $4,
                subscription_stripe_subscription_id = $5,
                subscription_current_period_end = $6,
                subscription_created_at = COALESCE(subscription_created_at, $7)
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(summary.plan.as_str())
        .bind(summary.status.as_str())
        .bind(&summary.stripe_customer_id)
        .bind(&summary.stripe_subscription_id)
        .bind(summary.current_period_end.map(|t| *t.as_datetime()))
        .bind(summary.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update subscription: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }

        Ok(())
    }

    async fn update_subscription_status(
        &self,
        id: &UserId,
        status: SubscriptionStatus,
        current_period_end: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                subscription_status = $2,
                subscription_current_period_end = COALESCE($3, subscription_current_period_end)
            WHERE id = $1 AND subscription_status IS NOT NULL
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(current_period_end.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update subscription status: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }

        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<User>, DomainError> {
        let query = format!(
            "SELECT {} FROM users WHERE subscription_status = 'active' ORDER BY created_at DESC",
            USER_COLUMNS
        );

        let rows: Vec<UserRow> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to list subscribers: {}", e),
                )
            })?;

        rows.into_iter().map(User::try_from).collect()
    }
}
