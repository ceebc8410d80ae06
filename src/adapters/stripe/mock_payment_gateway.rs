//! Mock payment gateway for testing and local development.
//!
//! Supports:
//! - Pre-configured subscriptions
//! - Error injection
//! - Call tracking
//!
//! Webhook verification uses the real verifier, so tests sign payloads
//! with [`sign_payload`](crate::domain::billing::sign_payload).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::billing::{StripeEvent, StripeWebhookVerifier, SubscriptionStatus, WebhookError};
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, GatewaySubscription, PaymentError, PaymentGateway,
};

/// A recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    CreateCheckoutSession(CreateCheckoutRequest),
    RetrieveSubscription(String),
}

#[derive(Default)]
struct MockState {
    subscriptions: HashMap<String, GatewaySubscription>,
    next_error: Option<PaymentError>,
    sessions_created: u64,
    call_log: Vec<GatewayCall>,
}

/// In-process stand-in for Stripe.
#[derive(Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
    verifier: Arc<StripeWebhookVerifier>,
}

impl MockPaymentGateway {
    /// Creates a mock that verifies webhooks against `webhook_secret`.
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState::default())),
            verifier: Arc::new(StripeWebhookVerifier::new(SecretString::new(
                webhook_secret.into(),
            ))),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test must not poison the mock for other assertions.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a subscription returned by `retrieve_subscription`.
    pub fn add_subscription(&self, subscription: GatewaySubscription) {
        self.state()
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// Registers an active monthly subscription for `id`.
    pub fn add_active_subscription(&self, id: impl Into<String>, period_start: i64) {
        self.add_subscription(GatewaySubscription {
            id: id.into(),
            customer_id: Some("cus_mock".to_string()),
            status: SubscriptionStatus::Active,
            current_period_start: period_start,
            current_period_end: period_start + 30 * 24 * 60 * 60,
            cancel_at_period_end: false,
        });
    }

    /// Fails the next gateway call with `error`.
    pub fn fail_next(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().call_log.clone()
    }

    /// Checkout requests made so far.
    pub fn checkout_requests(&self) -> Vec<CreateCheckoutRequest> {
        self.state()
            .call_log
            .iter()
            .filter_map(|call| match call {
                GatewayCall::CreateCheckoutSession(request) => Some(request.clone()),
                GatewayCall::RetrieveSubscription(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut state = self.state();
        state
            .call_log
            .push(GatewayCall::CreateCheckoutSession(request));

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        state.sessions_created += 1;
        let id = format!("cs_test_{}", state.sessions_created);
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.stripe.com/c/pay/{}", id)),
            id,
        })
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<GatewaySubscription, PaymentError> {
        let mut state = self.state();
        state
            .call_log
            .push(GatewayCall::RetrieveSubscription(subscription_id.to_string()));

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        state
            .subscriptions
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("Subscription"))
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<StripeEvent, WebhookError> {
        self.verifier.verify_and_parse(payload, signature)
    }
}
