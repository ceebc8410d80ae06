//! WebhookEventLog port - append-only record of every accepted webhook.
//!
//! Reconciliation failures never reach Stripe (the webhook is always
//! acknowledged), so this log is where they surface. Redelivered events
//! are flagged here rather than deduplicated.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, Timestamp};

/// How an accepted event ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    /// Routed to a handler that completed without failures.
    Processed,
    /// Unhandled type, or nothing to act on.
    Ignored,
    /// At least one step failed.
    Failed,
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOutcome::Processed => "processed",
            EventOutcome::Ignored => "ignored",
            EventOutcome::Failed => "failed",
        }
    }

    /// Parses the storage form. Unknown values read as `Failed`.
    pub fn from_storage(raw: &str) -> Self {
        match raw {
            "processed" => EventOutcome::Processed,
            "ignored" => EventOutcome::Ignored,
            _ => EventOutcome::Failed,
        }
    }
}

/// One delivery of one Stripe event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEventEntry {
    pub id: Uuid,
    pub event_id: String,
    pub event_type: String,
    pub outcome: EventOutcome,
    pub failures: Vec<String>,
    /// True when the event id had been delivered before.
    pub redelivery: bool,
    pub recorded_at: Timestamp,
}

impl WebhookEventEntry {
    pub fn new(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        outcome: EventOutcome,
        failures: Vec<String>,
        redelivery: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: event_id.into(),
            event_type: event_type.into(),
            outcome,
            failures,
            redelivery,
            recorded_at: Timestamp::now(),
        }
    }

    /// True when the entry belongs on the reconciliation report.
    pub fn needs_attention(&self) -> bool {
        self.outcome == EventOutcome::Failed || self.redelivery
    }
}

/// Port for the webhook event log.
#[async_trait]
pub trait WebhookEventLog: Send + Sync {
    /// Append an entry. Entries are never updated.
    async fn append(&self, entry: WebhookEventEntry) -> Result<(), DomainError>;

    /// Number of earlier deliveries of a Stripe event id.
    async fn deliveries_of(&self, event_id: &str) -> Result<u64, DomainError>;

    /// Failed or redelivered entries, newest first.
    async fn recent_failures(&self, limit: u32) -> Result<Vec<WebhookEventEntry>, DomainError>;
}
