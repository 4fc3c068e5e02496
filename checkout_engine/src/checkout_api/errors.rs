use thiserror::Error;

use crate::{
    db_types::{AuctionStatus, OrderId},
    traits::{ChargeStatus, CheckoutDbError, ProcessorError},
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutApiError {
    #[error("{0}")]
    Validation(String),
    #[error("User not found.")]
    PayerNotFound(String),
    #[error("Auction not found.")]
    AuctionNotFound(String),
    #[error("Order not found.")]
    OrderNotFound(OrderId),
    #[error("No order is linked to invoice {0}")]
    UnknownInvoice(String),
    #[error("Auction {0} has already been paid for.")]
    AuctionAlreadyCompleted(String),
    #[error("Auction {id} cannot be paid for, since it is {status}.")]
    AuctionNotPayable { id: String, status: AuctionStatus },
    #[error("Payment failed or requires additional action.")]
    ChargeNotConfirmed(ChargeStatus),
    #[error("This payment belongs to a different user.")]
    ChargeOwnershipMismatch(String),
    #[error("Payment processor error: {0}")]
    Processor(#[from] ProcessorError),
    #[error("{0}")]
    Database(#[from] CheckoutDbError),
    #[error("Payment {intent_id} was captured, but the order could not be saved. {reason}")]
    PersistenceAfterCapture { intent_id: String, reason: String },
}

impl CheckoutApiError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
}
