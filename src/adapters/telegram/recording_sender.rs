//! Notification sender that records messages instead of delivering them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{NotificationError, NotificationSender};

/// A message captured by [`RecordingNotificationSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: String,
    pub text: String,
}

/// Records every send attempt. Can be switched to fail delivery.
#[derive(Clone, Default)]
pub struct RecordingNotificationSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent sends return `DeliveryFailed`. Attempts are still recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn messages_to(&self, chat_id: &str) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| m.text)
            .collect()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotificationError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMessage {
                chat_id: chat_id.to_string(),
                text: text.to_string(),
            });
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::DeliveryFailed(
                "recording sender configured to fail".to_string(),
            ));
        }

        tracing::info!(chat_id, "Notification recorded");
        Ok(())
    }
}
