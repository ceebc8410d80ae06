//! ListActiveSubscribersHandler - Query handler for the admin subscriber list.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::billing::{BillingError, PlanTag, User};
use crate::ports::UserRepository;

/// Query for every user with an active subscription.
#[derive(Debug, Clone)]
pub struct ListActiveSubscribersQuery;

/// Active subscriber count per plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanBreakdown {
    pub starter: u64,
    pub professional: u64,
    pub enterprise: u64,
}

impl PlanBreakdown {
    fn count(&mut self, plan: PlanTag) {
        match plan {
            PlanTag::Starter => self.starter += 1,
            PlanTag::Professional => self.professional += 1,
            PlanTag::Enterprise => self.enterprise += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberStats {
    pub total_subscribers: u64,
    pub plan_breakdown: PlanBreakdown,
}

/// Active subscribers, newest first, with aggregate counts.
#[derive(Debug, Clone)]
pub struct ListActiveSubscribersResult {
    pub users: Vec<User>,
    pub stats: SubscriberStats,
}

pub struct ListActiveSubscribersHandler {
    users: Arc<dyn UserRepository>,
}

impl ListActiveSubscribersHandler {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn handle(
        &self,
        _query: ListActiveSubscribersQuery,
    ) -> Result<ListActiveSubscribersResult, BillingError> {
        let users = self.users.list_active().await?;

        let mut stats = SubscriberStats {
            total_subscribers: users.len() as u64,
            ..SubscriberStats::default()
        };
        for plan in users.iter().filter_map(User::plan) {
            stats.plan_breakdown.count(plan);
        }

        Ok(ListActiveSubscribersResult { users, stats })
    }
}
