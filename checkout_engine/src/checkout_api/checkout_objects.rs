use checkout_common::{Price, CARD_CURRENCY_CODE, SHOP_CURRENCY_CODE};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{BuyerDetails, Order},
    traits::{ChargeIntent, Invoice},
};

/// An item as submitted by the client at checkout. Every field is optional at parse time; the engine validates them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasedItem {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(rename = "currentPrice", default)]
    pub current_price: Option<Price>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl PurchasedItem {
    pub fn new<S: Into<String>>(id: S, title: S, price: Price, quantity: u32) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            price: Some(price),
            current_price: None,
            quantity: Some(quantity),
        }
    }
}

/// How the webhook path treats orders that are already in a terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Transitions only ever leave `processing`. Replays and conflicting events are no-ops.
    #[default]
    Strict,
    /// The event status is written unconditionally.
    Lenient,
}

/// Where unit prices come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PricingPolicy {
    #[default]
    ClientSupplied,
    /// Every item must reference a catalog product, and the catalog price is charged.
    Catalog,
}

#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    /// Base URL of the storefront. Payers are redirected back here after paying.
    pub client_url: String,
    pub shop_currency: String,
    pub card_currency: String,
    pub invoice_description: String,
    pub transition_policy: TransitionPolicy,
    pub pricing_policy: PricingPolicy,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            client_url: "http://localhost:3000".to_string(),
            shop_currency: SHOP_CURRENCY_CODE.to_string(),
            card_currency: CARD_CURRENCY_CODE.to_string(),
            invoice_description: "Shop order".to_string(),
            transition_policy: TransitionPolicy::default(),
            pricing_policy: PricingPolicy::default(),
        }
    }
}

impl CheckoutOptions {
    pub fn pending_url(&self, order_id: &str) -> String {
        format!("{}/pending?orderId={order_id}", self.client_url.trim_end_matches('/'))
    }
}

//--------------------------------------     Invoice events     --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceEventKind {
    Settled,
    Expired,
    Invalid,
    Other(String),
}

impl InvoiceEventKind {
    /// Maps a BTCPay webhook event type (e.g. `InvoiceSettled`) onto an event kind.
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "InvoiceSettled" => Self::Settled,
            "InvoiceExpired" => Self::Expired,
            "InvoiceInvalid" => Self::Invalid,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceEvent {
    pub invoice_id: String,
    pub kind: InvoiceEventKind,
}

impl InvoiceEvent {
    pub fn new<S: Into<String>>(invoice_id: S, event_type: &str) -> Self {
        Self { invoice_id: invoice_id.into(), kind: InvoiceEventKind::from_event_type(event_type) }
    }
}

//--------------------------------------     Requests & results     ----------------------------------------------------
#[derive(Debug, Clone)]
pub struct CryptoInvoice {
    pub order: Order,
    pub invoice: Invoice,
}

#[derive(Debug, Clone, Default)]
pub struct CardPaymentRequest {
    pub intent_id: String,
    pub payer_id: String,
    pub items: Vec<PurchasedItem>,
    pub buyer: BuyerDetails,
}

#[derive(Debug, Clone, Default)]
pub struct AuctionPaymentRequest {
    pub intent_id: String,
    pub payer_id: String,
    pub item: PurchasedItem,
    pub buyer: BuyerDetails,
}

#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub order: Order,
    pub charge: ChargeIntent,
    pub redirect_url: String,
    /// True when the intent had already been confirmed and the stored order is being returned again.
    pub replayed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Transitioned(Order),
    /// The order was found but its status did not change.
    Unchanged(Order),
    /// The event kind carries no status change.
    Ignored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileResult {
    pub completed: usize,
    pub canceled: usize,
    pub untouched: usize,
}
