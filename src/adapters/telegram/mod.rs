//! Telegram notification adapters.
//!
//! - `TelegramSender` - Bot API `sendMessage` over HTTPS
//! - `RecordingNotificationSender` - captures messages for tests and local runs

mod recording_sender;
mod telegram_sender;

pub use recording_sender::{RecordingNotificationSender, SentMessage};
pub use telegram_sender::{TelegramConfig, TelegramSender};
