//! Payment configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::billing::PlanPrices;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    #[serde(default)]
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    #[serde(default)]
    pub stripe_webhook_secret: String,

    /// Stripe price ID for the starter plan
    pub starter_price_id: Option<String>,

    /// Stripe price ID for the professional plan
    pub professional_price_id: Option<String>,

    /// Stripe price ID for the enterprise plan
    pub enterprise_price_id: Option<String>,

    /// Stripe API request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Price ids per plan, falling back to the `price_<plan>_monthly` defaults
    pub fn plan_prices(&self) -> PlanPrices {
        let defaults = PlanPrices::default();
        let pick = |configured: &Option<String>, default: String| {
            configured
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or(default)
        };

        PlanPrices {
            starter: pick(&self.starter_price_id, defaults.starter),
            professional: pick(&self.professional_price_id, defaults.professional),
            enterprise: pick(&self.enterprise_price_id, defaults.enterprise),
        }
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT__STRIPE_WEBHOOK_SECRET",
            ));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            starter_price_id: None,
            professional_price_id: None,
            enterprise_price_id: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PaymentConfig {
        PaymentConfig {
            stripe_api_key: "sk_test_xxx".to_string(),
            stripe_webhook_secret: "whsec_xxx".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_test_mode() {
        let config = valid();
        assert!(config.is_test_mode());
        assert!(!config.is_live_mode());
    }

    #[test]
    fn test_is_live_mode() {
        let config = PaymentConfig {
            stripe_api_key: "sk_live_xxx".to_string(),
            ..valid()
        };
        assert!(config.is_live_mode());
        assert!(!config.is_test_mode());
    }

    #[test]
    fn test_plan_prices_default() {
        assert_eq!(valid().plan_prices(), PlanPrices::default());
    }

    #[test]
    fn test_plan_prices_override() {
        let config = PaymentConfig {
            professional_price_id: Some("price_1Pro".to_string()),
            enterprise_price_id: Some("".to_string()),
            ..valid()
        };
        let prices = config.plan_prices();
        assert_eq!(prices.starter, "price_starter_monthly");
        assert_eq!(prices.professional, "price_1Pro");
        assert_eq!(prices.enterprise, "price_enterprise_monthly");
    }

    #[test]
    fn test_validation_missing_api_key() {
        let config = PaymentConfig {
            stripe_api_key: String::new(),
            ..valid()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"))
        );
    }

    #[test]
    fn test_validation_invalid_key_prefixes() {
        let config = PaymentConfig {
            stripe_api_key: "pk_test_xxx".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStripeKey));

        let config = PaymentConfig {
            stripe_webhook_secret: "secret".to_string(),
            ..valid()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        );
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid().validate().is_ok());
    }
}
