//! HTTP DTOs (Data Transfer Objects) for billing endpoints.
//!
//! JSON field names are camelCase to match the landing page frontend.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::SubscriberStats;
use crate::domain::billing::{
    PlanTag, SubscriptionRecord, SubscriptionStatus, SubscriptionSummary, User,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{EventOutcome, WebhookEventEntry};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/create-checkout-session`.
///
/// Missing fields deserialize as empty and fail validation with a 400.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCheckoutSessionRequest {
    pub plan: String,
    pub email: String,
    pub telegram_username: String,
    pub telegram_chat_id: String,
}

/// Query string of `GET /api/admin/webhook-failures`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookFailuresParams {
    pub limit: Option<u32>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAckResponse {
    pub received: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummaryResponse {
    pub plan: PlanTag,
    pub status: SubscriptionStatus,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: String,
    pub current_period_end: Option<String>,
    pub created_at: String,
}

impl From<SubscriptionSummary> for SubscriptionSummaryResponse {
    fn from(summary: SubscriptionSummary) -> Self {
        Self {
            plan: summary.plan,
            status: summary.status,
            stripe_customer_id: summary.stripe_customer_id,
            stripe_subscription_id: summary.stripe_subscription_id,
            current_period_end: summary.current_period_end.map(rfc3339),
            created_at: rfc3339(summary.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub telegram_username: String,
    pub telegram_chat_id: String,
    pub subscription: Option<SubscriptionSummaryResponse>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            telegram_username: user.telegram_username,
            telegram_chat_id: user.telegram_chat_id,
            subscription: user.subscription.map(SubscriptionSummaryResponse::from),
            created_at: rfc3339(user.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecordResponse {
    pub id: String,
    pub user_id: String,
    pub plan: PlanTag,
    pub status: SubscriptionStatus,
    pub stripe_subscription_id: String,
    pub current_period_start: Option<String>,
    pub current_period_end: Option<String>,
    pub cancel_at_period_end: bool,
    pub created_at: String,
}

impl From<SubscriptionRecord> for SubscriptionRecordResponse {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            id: record.id.to_string(),
            user_id: record.user_id.to_string(),
            plan: record.plan,
            status: record.status,
            stripe_subscription_id: record.stripe_subscription_id,
            current_period_start: record.current_period_start.map(rfc3339),
            current_period_end: record.current_period_end.map(rfc3339),
            cancel_at_period_end: record.cancel_at_period_end,
            created_at: rfc3339(record.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscribersResponse {
    pub users: Vec<UserResponse>,
    pub stats: SubscriberStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionHistoryResponse {
    pub user: UserResponse,
    pub subscriptions: Vec<SubscriptionRecordResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEventEntryResponse {
    pub id: String,
    pub event_id: String,
    pub event_type: String,
    pub outcome: EventOutcome,
    pub failures: Vec<String>,
    pub redelivery: bool,
    pub recorded_at: String,
}

impl From<WebhookEventEntry> for WebhookEventEntryResponse {
    fn from(entry: WebhookEventEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            event_id: entry.event_id,
            event_type: entry.event_type,
            outcome: entry.outcome,
            failures: entry.failures,
            redelivery: entry.redelivery,
            recorded_at: rfc3339(entry.recorded_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookFailuresResponse {
    pub entries: Vec<WebhookEventEntryResponse>,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
        }
    }
}

fn rfc3339(timestamp: Timestamp) -> String {
    timestamp.as_datetime().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::NewUser;

    #[test]
    fn checkout_request_reads_camel_case() {
        let request: CreateCheckoutSessionRequest = serde_json::from_str(
            r#"{"plan":"starter","email":"a@x.com","telegramUsername":"alice","telegramChatId":"42"}"#,
        )
        .unwrap();

        assert_eq!(request.plan, "starter");
        assert_eq!(request.telegram_username, "alice");
        assert_eq!(request.telegram_chat_id, "42");
    }

    #[test]
    fn checkout_request_tolerates_missing_fields() {
        let request: CreateCheckoutSessionRequest =
            serde_json::from_str(r#"{"plan":"starter"}"#).unwrap();
        assert!(request.email.is_empty());
    }

    #[test]
    fn checkout_response_uses_session_id_key() {
        let json = serde_json::to_value(CheckoutSessionResponse {
            session_id: "cs_test_1".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"sessionId": "cs_test_1"}));
    }

    #[test]
    fn user_response_without_subscription() {
        let user = User::register(NewUser::new("a@x.com", "alice", "42").unwrap());
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["telegramChatId"], "42");
        assert!(json["subscription"].is_null());
    }

    #[test]
    fn record_response_serializes_status_snake_case() {
        let mut record = SubscriptionRecord::activated(
            crate::domain::foundation::UserId::new(),
            PlanTag::Enterprise,
            "sub_1",
            None,
            None,
        );
        record.status = SubscriptionStatus::PastDue;

        let json = serde_json::to_value(SubscriptionRecordResponse::from(record)).unwrap();
        assert_eq!(json["status"], "past_due");
        assert_eq!(json["plan"], "enterprise");
        assert_eq!(json["cancelAtPeriodEnd"], false);
    }
}
