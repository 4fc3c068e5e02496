//! #  Storage and processor contracts.
//!
//! This module defines the interface contracts that the checkout engine needs from its collaborators.
//!
//! ## Storage
//! * [`CheckoutDatabase`] is the highest level of behaviour for storage backends. It persists orders and performs the
//!   guarded status transitions that the workflow relies on. Every write that touches more than one record is atomic.
//! * [`PayerManagement`] provides access to payers and their ordered list of order references.
//! * [`CatalogManagement`] holds the payment-relevant slice of auctions and the product catalog.
//!
//! ## Payment processors
//! * [`PaymentGateway`] wraps the card processor and the crypto invoicing service behind a uniform
//!   create / query / confirm contract. Implementations hold no business logic.
mod catalog_management;
mod checkout_database;
mod data_objects;
mod payer_management;
mod payment_gateway;

pub use catalog_management::CatalogManagement;
pub use checkout_database::{CheckoutDatabase, CheckoutDbError};
pub use data_objects::{ChargeIntent, ChargeIntentRequest, ChargeStatus, Invoice, InvoiceRequest, InvoiceStatus};
pub use payer_management::PayerManagement;
pub use payment_gateway::{PaymentGateway, ProcessorError};
