//! Delivery channels for notifications.
use futures::future::BoxFuture;
use log::*;
use processor_tools::TelegramApi;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Could not deliver notification. {0}")]
    Transport(String),
    #[error("Notification was not delivered within {0} seconds")]
    Timeout(u64),
}

/// Sends pre-formatted (MarkdownV2) chat messages.
pub trait ChatTransport: Send + Sync {
    fn send_chat<'a>(&'a self, chat_id: &'a str, text: &'a str) -> BoxFuture<'a, Result<(), NotificationError>>;
}

impl ChatTransport for TelegramApi {
    fn send_chat<'a>(&'a self, chat_id: &'a str, text: &'a str) -> BoxFuture<'a, Result<(), NotificationError>> {
        Box::pin(async move {
            self.send_message(chat_id, text).await.map_err(|e| NotificationError::Transport(e.to_string()))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    /// Heading shown above the body
    pub title: String,
    pub html: String,
}

/// Sends HTML emails.
pub trait EmailTransport: Send + Sync {
    fn send_email(&self, email: EmailMessage) -> BoxFuture<'_, Result<(), NotificationError>>;
}

/// An [`EmailTransport`] that writes the message to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl EmailTransport for LogMailer {
    fn send_email(&self, email: EmailMessage) -> BoxFuture<'_, Result<(), NotificationError>> {
        Box::pin(async move {
            info!("📣️ Email from {} to {}: {}", email.from, email.to, email.subject);
            debug!("📣️ {}\n{}", email.title, email.html);
            Ok(())
        })
    }
}
