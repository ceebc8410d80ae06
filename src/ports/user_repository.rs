//! UserRepository port - persistence for subscribers.

use async_trait::async_trait;

use crate::domain::billing::{NewUser, SubscriptionStatus, SubscriptionSummary, User};
use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// Port for storing subscribers.
///
/// Email is unique. Implementations must make `upsert_by_email` atomic so
/// concurrent checkouts for the same address converge on one row.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns the user with this email, creating it if absent.
    ///
    /// Contact fields of an existing user are left untouched.
    async fn upsert_by_email(&self, new_user: NewUser) -> Result<User, DomainError>;

    /// Find a user by ID.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find the user whose summary references a Stripe subscription.
    async fn find_by_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<User>, DomainError>;

    /// Replaces the user's subscription summary.
    ///
    /// A `created_at` already on file is kept; the summary's own value is
    /// used only for a first subscription.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user doesn't exist.
    async fn set_subscription(
        &self,
        id: &UserId,
        summary: SubscriptionSummary,
    ) -> Result<(), DomainError>;

    /// Updates status (and period end, when given) on the existing summary.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user doesn't exist or has no summary.
    async fn update_subscription_status(
        &self,
        id: &UserId,
        status: SubscriptionStatus,
        current_period_end: Option<Timestamp>,
    ) -> Result<(), DomainError>;

    /// Users whose summary status is `active`, newest first.
    async fn list_active(&self) -> Result<Vec<User>, DomainError>;
}
