//! Subscriber entity and its embedded subscription summary.

use crate::domain::foundation::{Timestamp, UserId, ValidationError};

use super::plan::PlanTag;
use super::status::SubscriptionStatus;

/// Contact details collected on the pricing page.
///
/// Validated once at the edge; repositories take it as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub telegram_username: String,
    pub telegram_chat_id: String,
}

impl NewUser {
    /// Validates and normalizes contact details.
    ///
    /// Surrounding whitespace is trimmed; the email must have a non-empty
    /// local part and domain around a single `@`.
    pub fn new(
        email: impl AsRef<str>,
        telegram_username: impl AsRef<str>,
        telegram_chat_id: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        let email = email.as_ref().trim();
        if email.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
            _ => return Err(ValidationError::invalid_format("email", "expected name@domain")),
        }

        let telegram_username = telegram_username.as_ref().trim();
        if telegram_username.is_empty() {
            return Err(ValidationError::empty_field("telegramUsername"));
        }

        let telegram_chat_id = telegram_chat_id.as_ref().trim();
        if telegram_chat_id.is_empty() {
            return Err(ValidationError::empty_field("telegramChatId"));
        }

        Ok(Self {
            email: email.to_string(),
            telegram_username: telegram_username.to_string(),
            telegram_chat_id: telegram_chat_id.to_string(),
        })
    }
}

/// Snapshot of the user's current subscription.
///
/// Reflects whichever webhook event for the subscription was processed last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSummary {
    pub plan: PlanTag,
    pub status: SubscriptionStatus,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: String,
    pub current_period_end: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// A subscriber. One per email address, never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub telegram_username: String,
    pub telegram_chat_id: String,
    pub subscription: Option<SubscriptionSummary>,
    pub created_at: Timestamp,
}

impl User {
    /// Creates a user with no subscription yet.
    pub fn register(new_user: NewUser) -> Self {
        Self {
            id: UserId::new(),
            email: new_user.email,
            telegram_username: new_user.telegram_username,
            telegram_chat_id: new_user.telegram_chat_id,
            subscription: None,
            created_at: Timestamp::now(),
        }
    }

    /// True when the summary status is `active`.
    pub fn is_active_subscriber(&self) -> bool {
        self.subscription
            .as_ref()
            .map(|s| s.status.is_active())
            .unwrap_or(false)
    }

    /// Plan of the current subscription, if any.
    pub fn plan(&self) -> Option<PlanTag> {
        self.subscription.as_ref().map(|s| s.plan)
    }

    /// True when the summary references the given Stripe subscription.
    pub fn holds_subscription(&self, stripe_subscription_id: &str) -> bool {
        self.subscription
            .as_ref()
            .map(|s| s.stripe_subscription_id == stripe_subscription_id)
            .unwrap_or(false)
    }
}
