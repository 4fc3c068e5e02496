//! [`PaymentGateway`] backed by the Stripe and BTCPay REST clients.
//!
//! This is a pure translation layer: requests are mapped onto the processor APIs and the responses (and errors) are
//! mapped back onto the engine's types.
use checkout_common::Cents;
use checkout_engine::traits::{
    ChargeIntent,
    ChargeIntentRequest,
    ChargeStatus,
    Invoice,
    InvoiceRequest,
    InvoiceStatus,
    PaymentGateway,
    ProcessorError,
};
use log::*;
use processor_tools::{
    BtcPayApi,
    BtcPayConfig,
    BtcPayInvoice,
    BtcPayInvoiceStatus,
    InvoiceCheckout,
    InvoiceMetadata,
    NewBtcPayInvoice,
    PaymentIntent,
    PaymentIntentStatus,
    ProcessorApiError,
    StripeApi,
    StripeConfig,
};

#[derive(Clone)]
pub struct ProcessorGateway {
    stripe: StripeApi,
    btcpay: BtcPayApi,
}

impl ProcessorGateway {
    pub fn new(stripe: StripeConfig, btcpay: BtcPayConfig) -> Result<Self, ProcessorApiError> {
        let stripe = StripeApi::new(stripe)?;
        let btcpay = BtcPayApi::new(btcpay)?;
        Ok(Self { stripe, btcpay })
    }
}

impl PaymentGateway for ProcessorGateway {
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<Invoice, ProcessorError> {
        let invoice = NewBtcPayInvoice {
            metadata: InvoiceMetadata { order_id: request.order_id.to_string(), item_desc: request.description },
            checkout: InvoiceCheckout { redirect_url: request.redirect_url },
            amount: request.amount,
            currency: request.currency,
        };
        let invoice =
            self.btcpay.create_invoice(invoice).await.map_err(|e| processor_error("Error creating invoice", e))?;
        Ok(to_invoice(invoice))
    }

    async fn fetch_invoice_status(&self, invoice_id: &str) -> Result<InvoiceStatus, ProcessorError> {
        let invoice =
            self.btcpay.get_invoice(invoice_id).await.map_err(|e| processor_error("Error fetching invoice", e))?;
        Ok(to_invoice_status(&invoice))
    }

    async fn create_charge_intent(&self, request: ChargeIntentRequest) -> Result<ChargeIntent, ProcessorError> {
        let intent = self
            .stripe
            .create_payment_intent(request.amount.value(), &request.currency, &request.payer_id)
            .await
            .map_err(|e| processor_error("Failed to create Payment Intent", e))?;
        Ok(to_charge(intent))
    }

    async fn fetch_charge(&self, charge_id: &str) -> Result<ChargeIntent, ProcessorError> {
        let intent = self
            .stripe
            .retrieve_payment_intent(charge_id)
            .await
            .map_err(|e| processor_error("Failed to retrieve Payment Intent", e))?;
        Ok(to_charge(intent))
    }

    async fn confirm_charge(&self, charge_id: &str) -> Result<ChargeIntent, ProcessorError> {
        let intent = self
            .stripe
            .confirm_payment_intent(charge_id)
            .await
            .map_err(|e| processor_error("Failed to confirm Payment Intent", e))?;
        Ok(to_charge(intent))
    }
}

fn processor_error(message: &str, e: ProcessorApiError) -> ProcessorError {
    debug!("💻️ {message}. {e}");
    ProcessorError::new(message).with_cause(e.to_string())
}

pub fn to_charge(intent: PaymentIntent) -> ChargeIntent {
    let status = match intent.status {
        PaymentIntentStatus::RequiresPaymentMethod => ChargeStatus::RequiresPaymentMethod,
        PaymentIntentStatus::RequiresConfirmation => ChargeStatus::RequiresConfirmation,
        PaymentIntentStatus::RequiresAction => ChargeStatus::RequiresAction,
        PaymentIntentStatus::Processing => ChargeStatus::Processing,
        PaymentIntentStatus::RequiresCapture => ChargeStatus::RequiresCapture,
        PaymentIntentStatus::Canceled => ChargeStatus::Canceled,
        PaymentIntentStatus::Succeeded => ChargeStatus::Succeeded,
        PaymentIntentStatus::Unknown => ChargeStatus::Unknown,
    };
    ChargeIntent {
        id: intent.id,
        amount: Cents::from(intent.amount),
        currency: intent.currency,
        status,
        client_secret: intent.client_secret,
    }
}

pub fn to_invoice(invoice: BtcPayInvoice) -> Invoice {
    let status = to_invoice_status(&invoice);
    Invoice { id: invoice.id, checkout_link: invoice.checkout_link, status }
}

/// Statuses we do not recognise are treated as still in flight, so that nothing is resolved on guesswork.
pub fn to_invoice_status(invoice: &BtcPayInvoice) -> InvoiceStatus {
    match invoice.status {
        BtcPayInvoiceStatus::New => InvoiceStatus::New,
        BtcPayInvoiceStatus::Processing => InvoiceStatus::Processing,
        BtcPayInvoiceStatus::Settled => InvoiceStatus::Settled,
        BtcPayInvoiceStatus::Expired => InvoiceStatus::Expired,
        BtcPayInvoiceStatus::Invalid => InvoiceStatus::Invalid,
        BtcPayInvoiceStatus::Unknown => {
            warn!("💻️ Invoice {} has a status we do not recognise. Treating it as processing.", invoice.id);
            InvoiceStatus::Processing
        },
    }
}
