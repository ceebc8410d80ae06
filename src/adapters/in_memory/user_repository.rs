//! In-memory implementation of UserRepository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::{NewUser, SubscriptionStatus, SubscriptionSummary, User};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::UserRepository;

/// Process-local user store.
///
/// A single write lock covers the email lookup and the insert, which gives
/// `upsert_by_email` the same convergence as the unique index in Postgres.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn user_not_found(id: &UserId) -> DomainError {
    DomainError::new(ErrorCode::UserNotFound, format!("User not found: {}", id))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn upsert_by_email(&self, new_user: NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.values().find(|u| u.email == new_user.email) {
            return Ok(existing.clone());
        }
        let user = User::register(new_user);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.holds_subscription(stripe_subscription_id))
            .cloned())
    }

    async fn set_subscription(
        &self,
        id: &UserId,
        summary: SubscriptionSummary,
    ) -> Result<(), DomainError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or_else(|| user_not_found(id))?;
        // First subscription date survives a re-subscribe, as in Postgres
        let created_at = user
            .subscription
            .as_ref()
            .map_or(summary.created_at, |existing| existing.created_at);
        user.subscription = Some(SubscriptionSummary {
            created_at,
            ..summary
        });
        Ok(())
    }

    async fn update_subscription_status(
        &self,
        id: &UserId,
        status: SubscriptionStatus,
        current_period_end: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        let mut users = self.users.write().await;
        let summary = users
            .get_mut(id)
            .and_then(|u| u.subscription.as_mut())
            .ok_or_else(|| user_not_found(id))?;
        summary.status = status;
        if current_period_end.is_some() {
            summary.current_period_end = current_period_end;
        }
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().await;
        let mut active: Vec<User> = users
            .values()
            .filter(|u| u.is_active_subscriber())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }
}
