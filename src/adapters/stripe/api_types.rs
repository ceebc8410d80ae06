//! Stripe REST API objects as returned by the endpoints we call.
//!
//! Only the fields we read are declared; serde ignores the rest.

use serde::{Deserialize, Serialize};

/// Response of `POST /v1/checkout/sessions`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    /// Unique session identifier (cs_...).
    pub id: String,

    /// Hosted checkout URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// Response of `GET /v1/subscriptions/{id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    /// Customer ID owning this subscription.
    #[serde(default)]
    pub customer: Option<String>,

    /// Subscription status.
    pub status: String,

    /// Current period start (Unix timestamp).
    pub current_period_start: i64,

    /// Current period end (Unix timestamp).
    pub current_period_end: i64,

    /// Whether subscription cancels at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_session_parses_without_url() {
        let session: StripeCheckoutSession =
            serde_json::from_str(r#"{"id":"cs_test_1","object":"checkout.session"}"#).unwrap();
        assert_eq!(session.id, "cs_test_1");
        assert!(session.url.is_none());
    }

    #[test]
    fn subscription_parses_stripe_payload() {
        let json = r#"{
            "id": "sub_123",
            "object": "subscription",
            "customer": "cus_456",
            "status": "active",
            "current_period_start": 1704067200,
            "current_period_end": 1706745600,
            "cancel_at_period_end": false,
            "items": {"object": "list", "data": []}
        }"#;

        let sub: StripeSubscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub.customer.as_deref(), Some("cus_456"));
        assert_eq!(sub.current_period_end, 1706745600);
    }

    #[test]
    fn error_response_parses() {
        let json = r#"{"error":{"type":"invalid_request_error","code":"resource_missing","message":"No such price: 'price_x'"}}"#;
        let err: StripeErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.code.as_deref(), Some("resource_missing"));
        assert_eq!(err.error.error_type.as_deref(), Some("invalid_request_error"));
    }
}
