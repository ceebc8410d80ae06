//! Historical subscription records.

use crate::domain::foundation::{SubscriptionRecordId, Timestamp, UserId};

use super::plan::PlanTag;
use super::status::SubscriptionStatus;

/// One row per completed checkout.
///
/// Created active on checkout completion, updated on subscription changes,
/// and marked `cancelled` (never removed) when Stripe deletes the
/// subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub id: SubscriptionRecordId,
    pub user_id: UserId,
    pub plan: PlanTag,
    pub status: SubscriptionStatus,
    pub stripe_subscription_id: String,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    pub created_at: Timestamp,
}

impl SubscriptionRecord {
    /// Creates an active record for a freshly completed checkout.
    pub fn activated(
        user_id: UserId,
        plan: PlanTag,
        stripe_subscription_id: impl Into<String>,
        current_period_start: Option<Timestamp>,
        current_period_end: Option<Timestamp>,
    ) -> Self {
        Self {
            id: SubscriptionRecordId::new(),
            user_id,
            plan,
            status: SubscriptionStatus::Active,
            stripe_subscription_id: stripe_subscription_id.into(),
            current_period_start,
            current_period_end,
            cancel_at_period_end: false,
            created_at: Timestamp::now(),
        }
    }
}

/// Fields changed by a `customer.subscription.updated` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChange {
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
}
