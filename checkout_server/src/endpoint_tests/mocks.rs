use checkout_engine::traits::{
    ChargeIntent,
    ChargeIntentRequest,
    Invoice,
    InvoiceRequest,
    InvoiceStatus,
    PaymentGateway,
    ProcessorError,
};
use mockall::mock;

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_invoice(&self, request: InvoiceRequest) -> Result<Invoice, ProcessorError>;
        async fn fetch_invoice_status(&self, invoice_id: &str) -> Result<InvoiceStatus, ProcessorError>;
        async fn create_charge_intent(&self, request: ChargeIntentRequest) -> Result<ChargeIntent, ProcessorError>;
        async fn fetch_charge(&self, charge_id: &str) -> Result<ChargeIntent, ProcessorError>;
        async fn confirm_charge(&self, charge_id: &str) -> Result<ChargeIntent, ProcessorError>;
    }
}
