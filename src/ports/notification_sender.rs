//! Notification sender port - outbound messages to subscribers.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from sending a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// The messaging service could not be reached or rejected the message.
    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Port for delivering a text message to a chat.
///
/// Callers treat delivery as best effort: failures are logged and
/// recorded, never propagated to webhook callers.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotificationError>;
}
