use thiserror::Error;

use crate::traits::{ChargeIntent, ChargeIntentRequest, Invoice, InvoiceRequest, InvoiceStatus};

/// Uniform contract over the two external payment processors.
///
/// * Card payments go through "charge intents". The client collects card details against the intent, and the server
///   later checks (and if necessary confirms) the intent before fulfilling the order.
/// * Crypto payments go through invoices. The payer is redirected to the invoice checkout page and settlement is
///   reported asynchronously.
///
/// Implementations must not retry calls, and must bound every call with a timeout.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<Invoice, ProcessorError>;

    async fn fetch_invoice_status(&self, invoice_id: &str) -> Result<InvoiceStatus, ProcessorError>;

    async fn create_charge_intent(&self, request: ChargeIntentRequest) -> Result<ChargeIntent, ProcessorError>;

    async fn fetch_charge(&self, charge_id: &str) -> Result<ChargeIntent, ProcessorError>;

    async fn confirm_charge(&self, charge_id: &str) -> Result<ChargeIntent, ProcessorError>;
}

/// An opaque failure reported by (or while talking to) a payment processor.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProcessorError {
    pub message: String,
    pub cause: Option<String>,
}

impl ProcessorError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into(), cause: None }
    }

    pub fn with_cause<S: Into<String>>(mut self, cause: S) -> Self {
        self.cause = Some(cause.into());
        self
    }
}
