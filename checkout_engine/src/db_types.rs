use std::{fmt::Display, str::FromStr};

use checkout_common::Price;
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {kind}: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The externally visible order identifier. Clients use it to poll for order status and processors carry it in their
/// metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh, random (v4 UUID) order id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// Waiting for the processor to settle the payment.
    Processing,
    /// The payment has been settled.
    Completed,
    /// The payment expired or was invalidated by the processor.
    Canceled,
}

impl OrderStatusType {
    /// `Completed` and `Canceled` are final. No further transitions are permitted out of either.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            s => Err(ConversionError::new("order status", s)),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to processing");
            Self::Processing
        })
    }
}

//--------------------------------------      ItemKind         ---------------------------------------------------------
/// What a line item refers to: a catalog product or a won auction lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ItemKind {
    Product,
    Auction,
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Product => write!(f, "Product"),
            Self::Auction => write!(f, "Auction"),
        }
    }
}

//--------------------------------------   PaymentProcessor    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentProcessor {
    /// Card payments, charged synchronously through payment intents.
    Card,
    /// Crypto payments, settled asynchronously through invoices and webhooks.
    Crypto,
}

impl PaymentProcessor {
    /// The name of the service behind the processor, as shown to shop admins.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Card => "Stripe",
            Self::Crypto => "BTCPay",
        }
    }
}

impl Display for PaymentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::Crypto => write!(f, "crypto"),
        }
    }
}

//--------------------------------------       LineItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct LineItem {
    pub id: i64,
    #[serde(skip)]
    pub order_ref: i64,
    pub title: String,
    /// Reference to the product or auction this item was bought from, when the client supplied one.
    pub item_ref: Option<String>,
    pub kind: ItemKind,
    #[sqlx(try_from = "String")]
    pub price: Price,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub title: String,
    pub item_ref: Option<String>,
    pub kind: ItemKind,
    pub price: Price,
    pub quantity: u32,
}

impl NewLineItem {
    /// `price × quantity`, or `None` if it overflows.
    pub fn subtotal(&self) -> Option<Price> {
        self.price.checked_mul(self.quantity)
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub payer_id: String,
    pub invoice_id: Option<String>,
    pub payment_intent_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub total_price: Price,
    pub currency: String,
    pub processor: PaymentProcessor,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<LineItem>,
}

impl Order {
    /// Auction orders contain exactly one auction line item.
    pub fn kind(&self) -> ItemKind {
        if self.items.iter().any(|i| i.kind == ItemKind::Auction) {
            ItemKind::Auction
        } else {
            ItemKind::Product
        }
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The client-correlatable order id
    pub order_id: OrderId,
    /// The payer that owns the order. Immutable once the order is stored.
    pub payer_id: String,
    /// The crypto invoice that will settle this order
    pub invoice_id: Option<String>,
    /// The card payment intent that paid for this order
    pub payment_intent_id: Option<String>,
    pub items: Vec<NewLineItem>,
    pub total_price: Price,
    pub currency: String,
    pub processor: PaymentProcessor,
    pub status: OrderStatusType,
}

impl NewOrder {
    pub fn new(order_id: OrderId, payer_id: String, items: Vec<NewLineItem>, total_price: Price, currency: &str) -> Self {
        Self {
            order_id,
            payer_id,
            invoice_id: None,
            payment_intent_id: None,
            items,
            total_price,
            currency: currency.to_string(),
            processor: PaymentProcessor::Card,
            status: OrderStatusType::Processing,
        }
    }

    /// A crypto order awaiting settlement of `invoice_id`.
    pub fn awaiting_invoice(mut self, invoice_id: String) -> Self {
        self.invoice_id = Some(invoice_id);
        self.processor = PaymentProcessor::Crypto;
        self.status = OrderStatusType::Processing;
        self
    }

    /// A card order whose payment intent has already succeeded.
    pub fn paid_by_card(mut self, payment_intent_id: String) -> Self {
        self.payment_intent_id = Some(payment_intent_id);
        self.processor = PaymentProcessor::Card;
        self.status = OrderStatusType::Completed;
        self
    }
}

//--------------------------------------        Payer          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Payer {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Orders owned by this payer, oldest first
    #[sqlx(skip)]
    pub orders: Vec<OrderId>,
}

#[derive(Debug, Clone)]
pub struct NewPayer {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl NewPayer {
    pub fn new<S: Into<String>>(id: S, email: S) -> Self {
        Self { id: id.into(), email: email.into(), name: None }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

//--------------------------------------     AuctionStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Active,
    Ended,
    /// The winner has paid. Set exactly once.
    Completed,
    Canceled,
}

impl AuctionStatus {
    pub fn is_payable(&self) -> bool {
        matches!(self, Self::Active | Self::Ended)
    }
}

impl Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Ended => write!(f, "ended"),
            Self::Completed => write!(f, "completed"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

//--------------------------------------        Auction        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Auction {
    pub id: String,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub current_price: Price,
    pub status: AuctionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuction {
    pub id: String,
    pub title: String,
    pub current_price: Price,
    pub status: AuctionStatus,
}

impl NewAuction {
    pub fn new<S: Into<String>>(id: S, title: S, current_price: Price) -> Self {
        Self { id: id.into(), title: title.into(), current_price, status: AuctionStatus::Ended }
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub price: Price,
}

impl Product {
    pub fn new<S: Into<String>>(id: S, title: S, price: Price) -> Self {
        Self { id: id.into(), title: title.into(), price }
    }
}

//--------------------------------------     BuyerDetails      ---------------------------------------------------------
/// Shipping and contact details submitted with a card checkout. Only used for notifications; never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyerDetails {
    pub country: String,
    pub city: String,
    pub street: String,
    pub zip: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub notes: Option<String>,
}

impl BuyerDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_string()
    }

    pub fn address(&self) -> String {
        format!("{}, {}, {}, {}", self.country, self.city, self.street, self.zip)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_status_round_trip() {
        for s in [OrderStatusType::Processing, OrderStatusType::Completed, OrderStatusType::Canceled] {
            assert_eq!(s.to_string().parse::<OrderStatusType>().unwrap(), s);
        }
        assert!("paid".parse::<OrderStatusType>().is_err());
        assert_eq!(OrderStatusType::from("nonsense".to_string()), OrderStatusType::Processing);
        assert!(!OrderStatusType::Processing.is_terminal());
        assert!(OrderStatusType::Canceled.is_terminal());
    }

    #[test]
    fn new_order_builders() {
        let order = NewOrder::new(OrderId::from("o1"), "u1".into(), vec![], Price::zero(), "BTC");
        let crypto = order.clone().awaiting_invoice("inv".into());
        assert_eq!(crypto.processor, PaymentProcessor::Crypto);
        assert_eq!(crypto.status, OrderStatusType::Processing);
        let card = order.paid_by_card("pi_1".into());
        assert_eq!(card.processor, PaymentProcessor::Card);
        assert_eq!(card.status, OrderStatusType::Completed);
        assert_eq!(card.payment_intent_id.as_deref(), Some("pi_1"));
    }

    #[test]
    fn random_order_ids_are_unique() {
        let a = OrderId::random();
        let b = OrderId::random();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn auctions_are_payable_until_completed() {
        assert!(AuctionStatus::Ended.is_payable());
        assert!(AuctionStatus::Active.is_payable());
        assert!(!AuctionStatus::Completed.is_payable());
        assert!(!AuctionStatus::Canceled.is_payable());
    }
}
