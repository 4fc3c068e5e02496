//! # Notifications
//!
//! Checkout events are announced to the shop admins by chat (Telegram) and email. Delivery happens on the event
//! handler tasks, never on the request path.
//!
//! * [`settings`]: per-channel category toggles and addresses, held in a reloadable snapshot.
//! * [`transports`]: the chat and email delivery traits.
//! * [`messages`]: formats orders into chat and email messages.
//! * [`dispatcher`]: applies the settings, bounds every send with a timeout and logs failures.
pub mod dispatcher;
pub mod messages;
pub mod settings;
pub mod transports;

pub use dispatcher::{create_notification_handlers, NotificationDispatcher};
pub use messages::{Channel, Notification};
pub use settings::{CategoryToggles, NotificationCategory, NotificationSettings, SettingsHandle};
pub use transports::{ChatTransport, EmailMessage, EmailTransport, LogMailer, NotificationError};
