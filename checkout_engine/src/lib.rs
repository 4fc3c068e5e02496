//! Checkout Engine
//!
//! The checkout engine turns payment signals from a card processor and a crypto invoicing service into durable order
//! and auction state. It is processor-agnostic: the processors are reached through the [`traits::PaymentGateway`]
//! contract, which the server implements.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`mod@traits`], [`mod@sqlite`]). Backends implement [`CheckoutDatabase`] and friends. SQLite is the
//!    supported backend. The data types stored in the database are defined in [`mod@db_types`] and are public.
//! 2. The checkout workflow ([`mod@checkout_api`]). [`CheckoutFlowApi`] creates invoices and payment intents, confirms
//!    card payments, applies webhook events and reconciles stale invoices.
//! 3. Events ([`mod@events`]). Successful payments and status transitions are published to background handlers, so
//!    that notifications never hold up a response.
pub mod checkout_api;
pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use checkout_api::{
    checkout_flow_api::CheckoutFlowApi,
    checkout_objects,
    errors::CheckoutApiError,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{CatalogManagement, CheckoutDatabase, CheckoutDbError, PayerManagement, PaymentGateway};
