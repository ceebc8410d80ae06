//! Subscription status as stored on users and subscription records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription lifecycle state.
///
/// Mirrors Stripe's subscription statuses. Stripe spells the terminal state
/// `canceled`; this crate stores it as `cancelled`. Statuses Stripe adds
/// later are kept as [`SubscriptionStatus::Unknown`] instead of failing the
/// webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Trialing,
    Paused,
    Cancelled,
    Expired,
    Unknown,
}

impl SubscriptionStatus {
    /// Maps a raw Stripe status string.
    pub fn from_stripe(raw: &str) -> Self {
        match raw {
            "active" => SubscriptionStatus::Active,
            "past_due" => SubscriptionStatus::PastDue,
            "unpaid" => SubscriptionStatus::Unpaid,
            "incomplete" => SubscriptionStatus::Incomplete,
            "incomplete_expired" => SubscriptionStatus::IncompleteExpired,
            "trialing" => SubscriptionStatus::Trialing,
            "paused" => SubscriptionStatus::Paused,
            "canceled" | "cancelled" => SubscriptionStatus::Cancelled,
            "expired" | "ended" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Unknown,
        }
    }

    /// Storage representation, also used on the admin API.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Unknown => "unknown",
        }
    }

    /// Parses the storage representation. Unrecognized values become `Unknown`.
    pub fn from_storage(raw: &str) -> Self {
        match raw {
            "unknown" => SubscriptionStatus::Unknown,
            other => Self::from_stripe(other),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
