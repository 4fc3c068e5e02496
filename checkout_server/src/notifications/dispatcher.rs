use std::{sync::Arc, time::Duration};

use checkout_engine::{
    db_types::{OrderStatusType, PaymentProcessor},
    events::{EventHandlers, EventHooks, OrderCompletedEvent, OrderStatusChangedEvent},
};
use log::*;

use crate::notifications::{
    messages::{order_chat_message, order_email, settlement_chat_message, Notification},
    settings::{NotificationCategory, SettingsHandle},
    transports::{ChatTransport, EmailTransport, NotificationError},
};

/// Sends notifications through the configured channels, honouring the current settings snapshot.
///
/// Delivery is best effort: every failure (including timeouts) is logged and swallowed.
#[derive(Clone)]
pub struct NotificationDispatcher {
    settings: SettingsHandle,
    chat: Option<Arc<dyn ChatTransport>>,
    email: Arc<dyn EmailTransport>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        settings: SettingsHandle,
        chat: Option<Arc<dyn ChatTransport>>,
        email: Arc<dyn EmailTransport>,
        timeout: Duration,
    ) -> Self {
        Self { settings, chat, email, timeout }
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    pub async fn notify(&self, category: NotificationCategory, notification: Notification) {
        let channel = notification.channel();
        match self.try_notify(category, notification).await {
            Ok(true) => debug!("📣️ Sent {category} notification via {channel}"),
            Ok(false) => trace!("📣️ {category} notifications via {channel} are switched off"),
            Err(e) => warn!("📣️ Could not send {category} notification via {channel}. {e}"),
        }
    }

    async fn try_notify(
        &self,
        category: NotificationCategory,
        notification: Notification,
    ) -> Result<bool, NotificationError> {
        let settings = self.settings.snapshot();
        match notification {
            Notification::Chat(text) => {
                if !settings.chat.is_enabled(category) || settings.chat_id.is_empty() {
                    return Ok(false);
                }
                let Some(chat) = &self.chat else {
                    return Ok(false);
                };
                self.bounded(chat.send_chat(&settings.chat_id, &text)).await?;
            },
            Notification::Email(email) => {
                if !settings.email.is_enabled(category) {
                    return Ok(false);
                }
                self.bounded(self.email.send_email(email)).await?;
            },
        }
        Ok(true)
    }

    async fn bounded<F>(&self, send: F) -> Result<(), NotificationError>
    where F: std::future::Future<Output = Result<(), NotificationError>> {
        tokio::time::timeout(self.timeout, send).await.map_err(|_| NotificationError::Timeout(self.timeout.as_secs()))?
    }

    /// Chat message and admin email for a freshly paid card order, sent concurrently. Auction orders are filed under
    /// [`NotificationCategory::AuctionWon`].
    pub async fn order_completed(&self, event: OrderCompletedEvent) {
        let settings = self.settings.snapshot();
        let category = NotificationCategory::for_kind(event.kind());
        let chat = Notification::Chat(order_chat_message(&event));
        let email = Notification::Email(order_email(&event, &settings));
        futures::join!(self.notify(category, chat), self.notify(category, email));
    }

    /// Chat message for crypto orders that have just settled. Other transitions are not announced.
    pub async fn status_changed(&self, event: OrderStatusChangedEvent) {
        let order = &event.order;
        if event.new_status() != OrderStatusType::Completed || order.processor != PaymentProcessor::Crypto {
            trace!("📣️ Order [{}] is now {}. Nothing to announce.", order.order_id, order.status);
            return;
        }
        let chat = Notification::Chat(settlement_chat_message(order));
        self.notify(NotificationCategory::NewOrder, chat).await;
    }
}

/// Builds the event handlers that fan checkout events out to the notification channels.
pub fn create_notification_handlers(dispatcher: NotificationDispatcher, buffer_size: usize) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let on_completed = dispatcher.clone();
    hooks.on_order_completed(move |ev| {
        let dispatcher = on_completed.clone();
        Box::pin(async move { dispatcher.order_completed(ev).await })
    });
    hooks.on_status_changed(move |ev| {
        let dispatcher = dispatcher.clone();
        Box::pin(async move { dispatcher.status_changed(ev).await })
    });
    EventHandlers::new(buffer_size, hooks)
}
