//! Webhook error types for Stripe webhook verification.
//!
//! Every variant is a rejection: the delivery is answered with 400 and
//! nothing is written.

use thiserror::Error;

/// Errors raised before a webhook event is accepted for processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// The Stripe-Signature header was absent.
    #[error("Missing Stripe-Signature header")]
    MissingSignature,

    /// The Stripe-Signature header could not be parsed.
    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),

    /// No v1 signature matched the payload.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is older than the tolerance window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Signature verified but the body is not a Stripe event envelope.
    #[error("Malformed event payload: {0}")]
    MalformedPayload(String),
}

impl WebhookError {
    /// True for every failure that means "this did not come from Stripe".
    pub fn is_signature_failure(&self) -> bool {
        !matches!(self, WebhookError::MalformedPayload(_))
    }
}
