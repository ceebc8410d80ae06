//! Immutable plan catalog.
//!
//! Built once at startup from configuration and shared through `Arc`.
//! Maps each [`PlanTag`] to its Stripe price and its advertised features.

use super::plan::{PlanTag, UnknownPlanTag};

const STARTER_FEATURES: &[&str] = &[
    "Gold (XAUUSD) Analysis",
    "3 Timeframes (M15, H1, H4)",
    "Daily Signals",
    "Basic Support",
];

const PROFESSIONAL_FEATURES: &[&str] = &[
    "Gold + Forex Analysis",
    "All 9 Timeframes",
    "Hourly Signals",
    "Priority Support",
    "Advanced Indicators",
];

const ENTERPRISE_FEATURES: &[&str] = &[
    "Everything in Professional",
    "Custom Timeframes",
    "API Access",
    "Dedicated Support",
    "White-label Options",
];

/// One purchasable plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDefinition {
    pub tag: PlanTag,
    pub display_name: &'static str,
    pub stripe_price_id: String,
    pub features: &'static [&'static str],
}

impl PlanDefinition {
    /// Features as a bulleted, newline-separated list.
    pub fn features_text(&self) -> String {
        self.features
            .iter()
            .map(|f| format!("• {}", f))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Stripe price ids for the three plans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanPrices {
    pub starter: String,
    pub professional: String,
    pub enterprise: String,
}

impl Default for PlanPrices {
    fn default() -> Self {
        Self {
            starter: "price_starter_monthly".to_string(),
            professional: "price_professional_monthly".to_string(),
            enterprise: "price_enterprise_monthly".to_string(),
        }
    }
}

/// Read-only lookup table of every plan.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    starter: PlanDefinition,
    professional: PlanDefinition,
    enterprise: PlanDefinition,
}

impl PlanCatalog {
    pub fn new(prices: PlanPrices) -> Self {
        Self {
            starter: PlanDefinition {
                tag: PlanTag::Starter,
                display_name: PlanTag::Starter.display_name(),
                stripe_price_id: prices.starter,
                features: STARTER_FEATURES,
            },
            professional: PlanDefinition {
                tag: PlanTag::Professional,
                display_name: PlanTag::Professional.display_name(),
                stripe_price_id: prices.professional,
                features: PROFESSIONAL_FEATURES,
            },
            enterprise: PlanDefinition {
                tag: PlanTag::Enterprise,
                display_name: PlanTag::Enterprise.display_name(),
                stripe_price_id: prices.enterprise,
                features: ENTERPRISE_FEATURES,
            },
        }
    }

    /// Returns the definition for a plan.
    pub fn get(&self, plan: PlanTag) -> &PlanDefinition {
        match plan {
            PlanTag::Starter => &self.starter,
            PlanTag::Professional => &self.professional,
            PlanTag::Enterprise => &self.enterprise,
        }
    }

    /// Parses a raw tag and returns its definition.
    pub fn lookup(&self, tag: &str) -> Result<&PlanDefinition, UnknownPlanTag> {
        let plan: PlanTag = tag.parse()?;
        Ok(self.get(plan))
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::new(PlanPrices::default())
    }
}
