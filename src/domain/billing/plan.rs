//! Plan tags offered on the pricing page.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Subscription plan a customer can buy.
///
/// Serialized lowercase both on the wire and in Stripe metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTag {
    /// Gold analysis on three timeframes.
    Starter,

    /// Gold and forex on all timeframes.
    Professional,

    /// Everything, plus API access and white-label options.
    Enterprise,
}

impl PlanTag {
    /// All plans in pricing-page order.
    pub const ALL: [PlanTag; 3] = [PlanTag::Starter, PlanTag::Professional, PlanTag::Enterprise];

    /// Returns the lowercase tag used in requests, metadata, and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTag::Starter => "starter",
            PlanTag::Professional => "professional",
            PlanTag::Enterprise => "enterprise",
        }
    }

    /// Returns the human-readable plan name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlanTag::Starter => "Starter",
            PlanTag::Professional => "Professional",
            PlanTag::Enterprise => "Enterprise",
        }
    }
}

impl fmt::Display for PlanTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string does not name a known plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown plan: '{0}'")]
pub struct UnknownPlanTag(pub String);

impl FromStr for PlanTag {
    type Err = UnknownPlanTag;

    /// Exact, case-sensitive match on the lowercase tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(PlanTag::Starter),
            "professional" => Ok(PlanTag::Professional),
            "enterprise" => Ok(PlanTag::Enterprise),
            other => Err(UnknownPlanTag(other.to_string())),
        }
    }
}
