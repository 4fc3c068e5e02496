use checkout_common::{Cents, Price};
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderId, OrderStatusType};

//--------------------------------------   Crypto invoices     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
    pub order_id: OrderId,
    pub amount: Price,
    pub currency: String,
    /// Short description shown to the payer on the invoice page
    pub description: String,
    /// Where the processor sends the payer once the invoice is paid
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: String,
    pub checkout_link: String,
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    New,
    Processing,
    Settled,
    Expired,
    Invalid,
}

impl InvoiceStatus {
    /// The order status that this invoice status resolves to, if the invoice has reached a final state.
    pub fn resolved_order_status(&self) -> Option<OrderStatusType> {
        match self {
            Self::Settled => Some(OrderStatusType::Completed),
            Self::Expired | Self::Invalid => Some(OrderStatusType::Canceled),
            Self::New | Self::Processing => None,
        }
    }
}

//--------------------------------------    Card charges       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeIntentRequest {
    pub amount: Cents,
    pub currency: String,
    /// Recorded in the processor's metadata so that the charge can be traced back to the payer
    pub payer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeIntent {
    pub id: String,
    pub amount: Cents,
    pub currency: String,
    pub status: ChargeStatus,
    #[serde(skip_serializing, default)]
    pub client_secret: Option<String>,
}

impl ChargeIntent {
    pub fn succeeded(&self) -> bool {
        self.status == ChargeStatus::Succeeded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}
