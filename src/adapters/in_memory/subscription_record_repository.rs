//! In-memory implementation of SubscriptionRecordRepository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::{SubscriptionChange, SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::SubscriptionRecordRepository;

#[derive(Default)]
pub struct InMemorySubscriptionRecordRepository {
    records: RwLock<Vec<SubscriptionRecord>>,
}

impl InMemorySubscriptionRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record, in insertion order.
    pub async fn all(&self) -> Vec<SubscriptionRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl SubscriptionRecordRepository for InMemorySubscriptionRecordRepository {
    async fn create(&self, record: &SubscriptionRecord) -> Result<(), DomainError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn count_for_subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<u64, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.stripe_subscription_id == stripe_subscription_id)
            .count() as u64)
    }

    async fn apply_change(
        &self,
        stripe_subscription_id: &str,
        change: &SubscriptionChange,
    ) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let mut touched = 0;
        for record in records
            .iter_mut()
            .filter(|r| r.stripe_subscription_id == stripe_subscription_id)
        {
            record.status = change.status;
            if change.current_period_end.is_some() {
                record.current_period_end = change.current_period_end;
            }
            record.cancel_at_period_end = change.cancel_at_period_end;
            touched += 1;
        }
        Ok(touched)
    }

    async fn set_status(
        &self,
        stripe_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let mut touched = 0;
        for record in records
            .iter_mut()
            .filter(|r| r.stripe_subscription_id == stripe_subscription_id)
        {
            record.status = status;
            touched += 1;
        }
        Ok(touched)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SubscriptionRecord>, DomainError> {
        let records = self.records.read().await;
        let mut owned: Vec<SubscriptionRecord> = records
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}
