//! SubscriptionRecordRepository port - subscription history.

use async_trait::async_trait;

use crate::domain::billing::{SubscriptionChange, SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::{DomainError, UserId};

/// Port for subscription records.
///
/// Records are never deleted. Several records may share a Stripe
/// subscription id (redelivered checkout events); updates apply to all of
/// them.
#[async_trait]
pub trait SubscriptionRecordRepository: Send + Sync {
    /// Save a new record.
    async fn create(&self, record: &SubscriptionRecord) -> Result<(), DomainError>;

    /// Number of records already referencing this Stripe subscription.
    async fn count_for_subscription(&self, stripe_subscription_id: &str)
        -> Result<u64, DomainError>;

    /// Applies a `customer.subscription.updated` change. Returns rows touched.
    async fn apply_change(
        &self,
        stripe_subscription_id: &str,
        change: &SubscriptionChange,
    ) -> Result<u64, DomainError>;

    /// Sets the status only. Returns rows touched.
    async fn set_status(
        &self,
        stripe_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<u64, DomainError>;

    /// Records of a user, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SubscriptionRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_record_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRecordRepository) {}
    }
}
