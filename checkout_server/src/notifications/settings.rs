use std::{env, fmt::Display, str::FromStr, sync::Arc};

use checkout_common::helpers::parse_list;
use checkout_engine::db_types::ItemKind;
use log::*;
use tokio::sync::watch;

pub const DEFAULT_SENDER: &str = "Shop <info@localhost>";
pub const DEFAULT_ADMIN_EMAIL: &str = "info@localhost";

/// What a notification is about. Each category can be switched on or off per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationCategory {
    /// A paid basket of products
    NewOrder,
    /// A paid auction lot
    AuctionWon,
}

impl NotificationCategory {
    pub fn for_kind(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Product => Self::NewOrder,
            ItemKind::Auction => Self::AuctionWon,
        }
    }
}

impl Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewOrder => write!(f, "new_order"),
            Self::AuctionWon => write!(f, "auction_won"),
        }
    }
}

impl FromStr for NotificationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new_order" => Ok(Self::NewOrder),
            "auction_won" => Ok(Self::AuctionWon),
            other => Err(format!("Unknown notification category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryToggles {
    pub new_order: bool,
    pub auction_won: bool,
}

impl Default for CategoryToggles {
    fn default() -> Self {
        Self::all()
    }
}

impl CategoryToggles {
    pub fn all() -> Self {
        Self { new_order: true, auction_won: true }
    }

    pub fn none() -> Self {
        Self { new_order: false, auction_won: false }
    }

    pub fn is_enabled(&self, category: NotificationCategory) -> bool {
        match category {
            NotificationCategory::NewOrder => self.new_order,
            NotificationCategory::AuctionWon => self.auction_won,
        }
    }

    pub fn set(&mut self, category: NotificationCategory, enabled: bool) -> &mut Self {
        match category {
            NotificationCategory::NewOrder => self.new_order = enabled,
            NotificationCategory::AuctionWon => self.auction_won = enabled,
        }
        self
    }

    /// Parses a comma separated list of enabled categories, e.g. `new_order,auction_won`. `none` disables every
    /// category. Unknown names are logged and skipped.
    pub fn from_list(value: &str) -> Self {
        let mut toggles = Self::none();
        for name in parse_list(value) {
            if name.eq_ignore_ascii_case("none") {
                continue;
            }
            match name.parse::<NotificationCategory>() {
                Ok(category) => {
                    toggles.set(category, true);
                },
                Err(e) => warn!("📣️ {e}. Ignoring it."),
            }
        }
        toggles
    }
}

/// A snapshot of everything the dispatcher needs to decide whether, and where, to send a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub email: CategoryToggles,
    pub chat: CategoryToggles,
    /// Telegram chat that receives chat notifications. Chat notifications are skipped when empty.
    pub chat_id: String,
    pub email_from: String,
    pub admin_email: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: CategoryToggles::default(),
            chat: CategoryToggles::default(),
            chat_id: String::default(),
            email_from: DEFAULT_SENDER.to_string(),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
        }
    }
}

impl NotificationSettings {
    pub fn from_env_or_default() -> Self {
        let default = Self::default();
        let email = env::var("CHK_EMAIL_CATEGORIES").map(|s| CategoryToggles::from_list(&s)).unwrap_or(default.email);
        let chat = env::var("CHK_CHAT_CATEGORIES").map(|s| CategoryToggles::from_list(&s)).unwrap_or(default.chat);
        let chat_id = env::var("CHK_TELEGRAM_CHAT_ID").unwrap_or_else(|_| {
            info!("🪛️ CHK_TELEGRAM_CHAT_ID is not set. Chat notifications are disabled.");
            String::default()
        });
        let email_from = env::var("CHK_EMAIL_FROM").unwrap_or(default.email_from);
        let admin_email = env::var("CHK_ADMIN_EMAIL").unwrap_or_else(|_| {
            info!("🪛️ CHK_ADMIN_EMAIL is not set. Using {DEFAULT_ADMIN_EMAIL}");
            default.admin_email
        });
        Self { email, chat, chat_id, email_from, admin_email }
    }
}

/// Shared, explicitly reloadable access to the current [`NotificationSettings`].
///
/// Readers take a cheap snapshot per notification; nothing is looked up globally. Call [`Self::reload_settings`] to
/// swap in a new snapshot, e.g. after an admin has changed the toggles.
#[derive(Clone)]
pub struct SettingsHandle {
    sender: Arc<watch::Sender<NotificationSettings>>,
    receiver: watch::Receiver<NotificationSettings>,
}

impl SettingsHandle {
    pub fn new(settings: NotificationSettings) -> Self {
        let (sender, receiver) = watch::channel(settings);
        Self { sender: Arc::new(sender), receiver }
    }

    pub fn snapshot(&self) -> NotificationSettings {
        self.receiver.borrow().clone()
    }

    pub fn reload_settings(&self, settings: NotificationSettings) {
        debug!("📣️ Notification settings reloaded");
        self.sender.send_replace(settings);
    }
}
