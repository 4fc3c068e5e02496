use std::fmt::Display;

use checkout_engine::{
    db_types::{BuyerDetails, ItemKind, Order},
    events::OrderCompletedEvent,
};
use processor_tools::escape_markdown;

use crate::notifications::{settings::NotificationSettings, transports::EmailMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Email,
    Chat,
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// A fully formatted message. The variant decides which channel it goes out on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// MarkdownV2 text, already escaped
    Chat(String),
    Email(EmailMessage),
}

impl Notification {
    pub fn channel(&self) -> Channel {
        match self {
            Self::Chat(_) => Channel::Chat,
            Self::Email(_) => Channel::Email,
        }
    }
}

fn md<T: Display>(value: T) -> String {
    escape_markdown(&value.to_string())
}

fn heading(order: &Order) -> String {
    match order.kind() {
        ItemKind::Auction => format!("*New Order {}*", md("(Auction)")),
        ItemKind::Product => "*New Order*".to_string(),
    }
}

fn chat_summary(order: &Order) -> String {
    let items = order
        .items
        .iter()
        .map(|item| format!("▪️ *{}* x{}", md(&item.title), md(item.quantity)))
        .collect::<Vec<String>>()
        .join("\n");
    format!(
        "⚡️ {}\n\n🛒 *Items:*\n{items}\n\n*Total price:* `{} {}`\n*Order ID:* `{}`\n*Status:* ✅ *{}*\n*PayProcessor:* \
         *{}*\n",
        heading(order),
        md(order.total_price.to_fixed(4)),
        md(&order.currency),
        md(&order.order_id),
        md(order.status),
        md(order.processor.label()),
    )
}

/// Chat message for a card order that has just been paid.
pub fn order_chat_message(event: &OrderCompletedEvent) -> String {
    let OrderCompletedEvent { order, payer, buyer } = event;
    let mut text = chat_summary(order);
    text.push_str(&format!(
        "\n📍 *Shipping Address:*\n {}\n\n👤 *Buyer Details:*\n *Full name:* {}\n *Email:* `{}`\n *Phone:* `{}`\n",
        md(buyer.address()),
        md(buyer.full_name()),
        md(&payer.email),
        md(&buyer.phone),
    ));
    if let Some(notes) = notes(buyer) {
        text.push_str(&format!("\n*Notes:* {}\n", md(notes)));
    }
    text
}

/// Chat message for a crypto order whose invoice has just settled.
pub fn settlement_chat_message(order: &Order) -> String {
    let mut text = chat_summary(order);
    text.push_str(&format!("\n👤 *Payer ID:* `{}`\n", md(&order.payer_id)));
    text
}

/// Admin email for a card order that has just been paid.
pub fn order_email(event: &OrderCompletedEvent, settings: &NotificationSettings) -> EmailMessage {
    let OrderCompletedEvent { order, payer, buyer } = event;
    let label = match order.kind() {
        ItemKind::Auction => " (Auction)",
        ItemKind::Product => "",
    };
    let items = order
        .items
        .iter()
        .map(|item| format!("■ {} x{}", html(&item.title), item.quantity))
        .collect::<Vec<String>>()
        .join("<br>");
    let mut body = format!(
        "<p>Congratulations! You received a new order{label}.<br><b>Items purchased:</b><br>{items}</p>\n<p><b>Total \
         Price:</b> {} {}<br><b>Order ID:</b> {}<br><b>Status:</b> {}<br><b>Payment Processor:</b> {}</p>\n<p><b>Shipping \
         Address:</b><br>{}</p>\n<p><b>Buyer Details:</b><br><b>Full Name:</b> {}<br><b>Email:</b> {}<br><b>Phone:</b> \
         {}</p>\n",
        order.total_price.to_fixed(4),
        html(&order.currency),
        html(order.order_id.as_str()),
        order.status,
        order.processor.label(),
        html(&buyer.address()),
        html(&buyer.full_name()),
        html(&payer.email),
        html(&buyer.phone),
    );
    if let Some(notes) = notes(buyer) {
        body.push_str(&format!("<p><b>Notes:</b><br>{}</p>\n", html(notes)));
    }
    EmailMessage {
        from: settings.email_from.clone(),
        to: settings.admin_email.clone(),
        subject: "🎉 New Order - Admin Notification".to_string(),
        title: "New Order from website".to_string(),
        html: body,
    }
}

fn notes(buyer: &BuyerDetails) -> Option<&str> {
    buyer.notes.as_deref().map(str::trim).filter(|n| !n.is_empty())
}

fn html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}
