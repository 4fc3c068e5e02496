//! Request and response bodies for the HTTP routes. Field names follow the storefront client (camelCase).
use std::fmt::Display;

use checkout_common::Cents;
use checkout_engine::{
    checkout_objects::{AuctionPaymentRequest, CardPaymentRequest, PaymentConfirmation, PurchasedItem},
    db_types::{BuyerDetails, OrderId, OrderStatusType},
    traits::ChargeIntent,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//----------------------------------------------   Crypto invoices  ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateInvoiceRequest {
    pub items_purchased: Vec<PurchasedItem>,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceResponse {
    pub success: bool,
    pub checkout_link: String,
    pub order_id: OrderId,
    pub invoice_id: String,
}

/// The fields of a BTCPay Greenfield webhook delivery that we act on. Everything else in the payload is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceWebhookEvent {
    pub invoice_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

//----------------------------------------------   Card payments    ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentIntentRequest {
    pub amount: Cents,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
}

impl From<ChargeIntent> for PaymentIntentResponse {
    fn from(intent: ChargeIntent) -> Self {
        Self { client_secret: intent.client_secret, payment_intent_id: intent.id }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    #[serde(default)]
    pub payment_intent_id: String,
    #[serde(default)]
    pub items_purchased: Vec<PurchasedItem>,
    #[serde(default)]
    pub user_id: String,
    #[serde(flatten)]
    pub buyer: BuyerDetails,
}

impl From<ConfirmPaymentRequest> for CardPaymentRequest {
    fn from(req: ConfirmPaymentRequest) -> Self {
        Self { intent_id: req.payment_intent_id, payer_id: req.user_id, items: req.items_purchased, buyer: req.buyer }
    }
}

/// Same shape as [`ConfirmPaymentRequest`], but `itemsPurchased` is the single auction being paid for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmAuctionRequest {
    #[serde(default)]
    pub payment_intent_id: String,
    #[serde(default)]
    pub items_purchased: PurchasedItem,
    #[serde(default)]
    pub user_id: String,
    #[serde(flatten)]
    pub buyer: BuyerDetails,
}

impl From<ConfirmAuctionRequest> for AuctionPaymentRequest {
    fn from(req: ConfirmAuctionRequest) -> Self {
        Self { intent_id: req.payment_intent_id, payer_id: req.user_id, item: req.items_purchased, buyer: req.buyer }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentResponse {
    pub message: String,
    pub payment_intent: ChargeIntent,
    pub order_id: OrderId,
    pub redirect_url: String,
}

impl From<PaymentConfirmation> for ConfirmPaymentResponse {
    fn from(confirmation: PaymentConfirmation) -> Self {
        Self {
            message: "Payment confirmed!".to_string(),
            payment_intent: confirmation.charge,
            order_id: confirmation.order.order_id,
            redirect_url: confirmation.redirect_url,
        }
    }
}

//----------------------------------------------   Order status    -----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    pub success: bool,
    pub status: OrderStatusType,
}
