//! # Checkout workflow
//!
//! [`CheckoutFlowApi`] is the public face of the engine. Server routes call into it for every checkout step:
//!
//! * creating crypto invoices and applying their webhook events,
//! * creating and confirming card payment intents for products and auction wins,
//! * answering order status queries,
//! * reconciling invoice orders whose webhook never arrived.
//!
//! Pricing rules live in [`pricing`]. Request and result types live in [`checkout_objects`].
pub mod checkout_flow_api;
pub mod checkout_objects;
pub mod errors;
pub mod pricing;
