//! ListWebhookFailuresHandler - Query handler for the reconciliation report.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::ports::{WebhookEventEntry, WebhookEventLog};

pub const DEFAULT_FAILURE_LIMIT: u32 = 50;
pub const MAX_FAILURE_LIMIT: u32 = 500;

/// Query for failed or redelivered webhook events.
#[derive(Debug, Clone, Default)]
pub struct ListWebhookFailuresQuery {
    pub limit: Option<u32>,
}

impl ListWebhookFailuresQuery {
    /// Requested limit clamped to `1..=MAX_FAILURE_LIMIT`.
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_FAILURE_LIMIT)
            .clamp(1, MAX_FAILURE_LIMIT)
    }
}

pub type ListWebhookFailuresResult = Vec<WebhookEventEntry>;

pub struct ListWebhookFailuresHandler {
    event_log: Arc<dyn WebhookEventLog>,
}

impl ListWebhookFailuresHandler {
    pub fn new(event_log: Arc<dyn WebhookEventLog>) -> Self {
        Self { event_log }
    }

    pub async fn handle(
        &self,
        query: ListWebhookFailuresQuery,
    ) -> Result<ListWebhookFailuresResult, BillingError> {
        Ok(self.event_log.recent_failures(query.effective_limit()).await?)
    }
}
