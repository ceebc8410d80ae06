//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port over Stripe's form-encoded REST API.
//!
//! # Security
//!
//! - Webhook signatures use HMAC-SHA256 with constant-time comparison
//! - Timestamps are validated to prevent replay attacks (5-minute window)
//! - All secrets are handled via `secrecy::SecretString`

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::billing::{StripeEvent, StripeWebhookVerifier, SubscriptionStatus, WebhookError};
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, GatewaySubscription, PaymentError, PaymentErrorCode,
    PaymentGateway,
};

use super::api_types::{StripeCheckoutSession, StripeErrorResponse, StripeSubscription};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: SecretString, webhook_secret: SecretString) -> Self {
        Self {
            api_key,
            webhook_secret,
            api_base_url: "https://api.stripe.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Stripe payment gateway adapter.
pub struct StripeGateway {
    config: StripeConfig,
    verifier: StripeWebhookVerifier,
    http_client: reqwest::Client,
}

impl StripeGateway {
    /// Create a new Stripe gateway with the given configuration.
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::network(format!("Failed to build HTTP client: {}", e)))?;
        let verifier = StripeWebhookVerifier::new(config.webhook_secret.clone());

        Ok(Self {
            config,
            verifier,
            http_client,
        })
    }

    /// Turns a non-2xx response into a `PaymentError`.
    async fn error_from_response(response: reqwest::Response) -> PaymentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        map_stripe_error(status.as_u16(), &body)
    }
}

/// Form parameters for `POST /v1/checkout/sessions`.
fn checkout_form(request: &CreateCheckoutRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_string(), "subscription".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("line_items[0][price]".to_string(), request.price_id.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("customer_email".to_string(), request.customer_email.clone()),
    ];

    for (key, value) in &request.metadata {
        params.push((format!("metadata[{}]", key), value.clone()));
    }

    params
}

/// Maps a Stripe HTTP status and error body to a `PaymentError`.
fn map_stripe_error(status: u16, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<StripeErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| format!("Stripe API error (HTTP {})", status));

    let code = match status {
        401 | 403 => PaymentErrorCode::AuthenticationError,
        404 => PaymentErrorCode::NotFound,
        429 => PaymentErrorCode::RateLimitExceeded,
        400..=499 => PaymentErrorCode::InvalidRequest,
        500..=599 => PaymentErrorCode::ProviderError,
        _ => PaymentErrorCode::Unknown,
    };

    let error = PaymentError::new(code, message);
    match parsed.and_then(|e| e.error.code) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}

impl From<StripeSubscription> for GatewaySubscription {
    fn from(sub: StripeSubscription) -> Self {
        GatewaySubscription {
            id: sub.id,
            customer_id: sub.customer,
            status: SubscriptionStatus::from_stripe(&sub.status),
            current_period_start: sub.current_period_start,
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&checkout_form(&request))
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error = Self::error_from_response(response).await;
            tracing::error!(error = %error, price_id = %request.price_id, "Stripe create_checkout_session failed");
            return Err(error);
        }

        let session: StripeCheckoutSession = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<GatewaySubscription, PaymentError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url, subscription_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error = Self::error_from_response(response).await;
            tracing::error!(error = %error, subscription_id, "Stripe retrieve_subscription failed");
            return Err(error);
        }

        let sub: StripeSubscription = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(sub.into())
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<StripeEvent, WebhookError> {
        self.verifier.verify_and_parse(payload, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::sign_payload;
    use std::collections::BTreeMap;

    const WEBHOOK_SECRET: &str = "whsec_test_secret";

    fn test_config() -> StripeConfig {
        StripeConfig::new(
            SecretString::new("sk_test_123".to_string()),
            SecretString::new(WEBHOOK_SECRET.to_string()),
        )
    }

    fn checkout_request() -> CreateCheckoutRequest {
        let mut metadata = BTreeMap::new();
        metadata.insert("plan".to_string(), "starter".to_string());
        metadata.insert("userId".to_string(), "u-1".to_string());
        CreateCheckoutRequest {
            price_id: "price_starter_monthly".to_string(),
            customer_email: "a@x.com".to_string(),
            success_url: "https://tg.example/success?session_id={CHECKOUT_SESSION_ID}".to_string(),
            cancel_url: "https://tg.example/pricing".to_string(),
            metadata,
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Configuration Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn config_new_sets_defaults() {
        let config = test_config();
        assert_eq!(config.api_base_url, "https://api.stripe.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn config_with_base_url_trims_trailing_slash() {
        let config = test_config().with_base_url("http://localhost:12111/");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    // ══════════════════════════════════════════════════════════════
    // Request Encoding Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn checkout_form_contains_single_subscription_line_item() {
        let params = checkout_form(&checkout_request());
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("subscription"));
        assert_eq!(get("line_items[0][price]"), Some("price_starter_monthly"));
        assert_eq!(get("line_items[0][quantity]"), Some("1"));
        assert_eq!(get("customer_email"), Some("a@x.com"));
        assert_eq!(get("metadata[plan]"), Some("starter"));
        assert_eq!(get("metadata[userId]"), Some("u-1"));
        assert_eq!(
            get("success_url"),
            Some("https://tg.example/success?session_id={CHECKOUT_SESSION_ID}")
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn error_mapping_uses_stripe_message_and_code() {
        let body = r#"{"error":{"type":"invalid_request_error","code":"resource_missing","message":"No such subscription: 'sub_x'"}}"#;
        let err = map_stripe_error(404, body);

        assert_eq!(err.code, PaymentErrorCode::NotFound);
        assert_eq!(err.message, "No such subscription: 'sub_x'");
        assert_eq!(err.provider_code.as_deref(), Some("resource_missing"));
    }

    #[test]
    fn error_mapping_by_status() {
        assert_eq!(map_stripe_error(401, "").code, PaymentErrorCode::AuthenticationError);
        assert_eq!(map_stripe_error(429, "").code, PaymentErrorCode::RateLimitExceeded);
        assert_eq!(map_stripe_error(400, "").code, PaymentErrorCode::InvalidRequest);
        assert_eq!(map_stripe_error(502, "").code, PaymentErrorCode::ProviderError);
    }

    #[test]
    fn error_mapping_tolerates_non_json_body() {
        let err = map_stripe_error(500, "<html>oops</html>");
        assert_eq!(err.message, "Stripe API error (HTTP 500)");
        assert!(err.retryable);
    }

    #[test]
    fn stripe_subscription_converts_canceled_status() {
        let sub = StripeSubscription {
            id: "sub_1".to_string(),
            customer: Some("cus_1".to_string()),
            status: "canceled".to_string(),
            current_period_start: 1,
            current_period_end: 2,
            cancel_at_period_end: true,
        };

        let converted: GatewaySubscription = sub.into();
        assert_eq!(converted.status, SubscriptionStatus::Cancelled);
        assert!(converted.cancel_at_period_end);
    }

    // ══════════════════════════════════════════════════════════════
    // Webhook Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn verify_webhook_valid_signature_and_payload() {
        let gateway = StripeGateway::new(test_config()).unwrap();
        let payload = r#"{"id":"evt_1","type":"invoice.payment_failed","created":1704067200,"data":{"object":{"id":"in_1"}},"livemode":false}"#;
        let header = sign_payload(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), payload.as_bytes());

        let event = gateway
            .verify_webhook(payload.as_bytes(), &header)
            .await
            .unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, "invoice.payment_failed");
    }

    #[tokio::test]
    async fn verify_webhook_rejects_invalid_signature() {
        let gateway = StripeGateway::new(test_config()).unwrap();
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign_payload("whsec_wrong", chrono::Utc::now().timestamp(), payload);

        let result = gateway.verify_webhook(payload, &header).await;

        assert_eq!(result.unwrap_err(), WebhookError::InvalidSignature);
    }

    #[tokio::test]
    async fn verify_webhook_rejects_malformed_header() {
        let gateway = StripeGateway::new(test_config()).unwrap();

        let result = gateway.verify_webhook(b"{}", "garbage").await;

        assert!(matches!(result, Err(WebhookError::MalformedHeader(_))));
    }
}
