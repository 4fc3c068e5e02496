mod btcpay;
mod config;
mod data_objects;
mod error;
mod rest;
mod stripe;
mod telegram;

pub use btcpay::BtcPayApi;
pub use config::{BtcPayConfig, StripeConfig, TelegramConfig};
pub use data_objects::{
    BtcPayInvoice,
    BtcPayInvoiceStatus,
    InvoiceCheckout,
    InvoiceMetadata,
    NewBtcPayInvoice,
    PaymentIntent,
    PaymentIntentStatus,
};
pub use error::ProcessorApiError;
pub use stripe::StripeApi;
pub use telegram::{escape_markdown, TelegramApi};
