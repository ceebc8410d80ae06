//! Billing error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | UnknownPlan | 400 |
//! | SignatureInvalid | 400 |
//! | MalformedEvent | 400 |
//! | ValidationFailed | 400 |
//! | NotFound | 404 |
//! | Gateway | 500 |
//! | Infrastructure | 500 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

use super::plan::UnknownPlanTag;
use super::webhook_errors::WebhookError;

/// Errors surfaced by the billing command and query handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// Requested plan is not in the catalog.
    #[error("Invalid plan selected: {0}")]
    UnknownPlan(String),

    /// Webhook did not come from Stripe (or is stale).
    #[error("Webhook signature verification failed: {0}")]
    SignatureInvalid(String),

    /// Webhook verified but its body is not a usable event.
    #[error("Malformed webhook event: {0}")]
    MalformedEvent(String),

    /// Requested resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Input failed validation.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// Payment gateway call failed.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Storage or other infrastructure failure.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl BillingError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        BillingError::NotFound(resource.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Machine-readable code returned in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            BillingError::UnknownPlan(_) => "UNKNOWN_PLAN",
            BillingError::SignatureInvalid(_) => "INVALID_SIGNATURE",
            BillingError::MalformedEvent(_) => "MALFORMED_EVENT",
            BillingError::NotFound(_) => "NOT_FOUND",
            BillingError::ValidationFailed { .. } => "VALIDATION_FAILED",
            BillingError::Gateway(_) => "PAYMENT_GATEWAY_ERROR",
            BillingError::Infrastructure(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the caller sent something we cannot act on.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            BillingError::Gateway(_) | BillingError::Infrastructure(_)
        )
    }
}

impl From<UnknownPlanTag> for BillingError {
    fn from(err: UnknownPlanTag) -> Self {
        BillingError::UnknownPlan(err.0)
    }
}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        BillingError::ValidationFailed {
            field: err.field().to_string(),
            message,
        }
    }
}

impl From<WebhookError> for BillingError {
    fn from(err: WebhookError) -> Self {
        if err.is_signature_failure() {
            BillingError::SignatureInvalid(err.to_string())
        } else {
            BillingError::MalformedEvent(err.to_string())
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::UserNotFound => BillingError::NotFound("User".to_string()),
            ErrorCode::ValidationFailed => BillingError::ValidationFailed {
                field: err.field.unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::DatabaseError => BillingError::Infrastructure(err.to_string()),
        }
    }
}
