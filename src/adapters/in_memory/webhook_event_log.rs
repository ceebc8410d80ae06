//! In-memory implementation of WebhookEventLog.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{WebhookEventEntry, WebhookEventLog};

#[derive(Default)]
pub struct InMemoryWebhookEventLog {
    entries: RwLock<Vec<WebhookEventEntry>>,
}

impl InMemoryWebhookEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry, oldest first.
    pub async fn entries(&self) -> Vec<WebhookEventEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl WebhookEventLog for InMemoryWebhookEventLog {
    async fn append(&self, entry: WebhookEventEntry) -> Result<(), DomainError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn deliveries_of(&self, event_id: &str) -> Result<u64, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| e.event_id == event_id).count() as u64)
    }

    async fn recent_failures(&self, limit: u32) -> Result<Vec<WebhookEventEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.needs_attention())
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
