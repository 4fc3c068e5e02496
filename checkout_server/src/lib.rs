//! # Checkout server
//! This crate hosts the HTTP server for the shop's checkout. It is responsible for:
//! * Creating BTCPay invoices for crypto checkouts, and applying BTCPay webhook events to the resulting orders.
//! * Creating Stripe payment intents and confirming card payments for baskets and won auctions.
//! * Reporting order status to the storefront.
//! * Notifying the shop admins of new orders, by chat and email.
//! * Periodically reconciling crypto orders whose webhook never arrived.
//!
//! The checkout workflow itself lives in `checkout_engine`. This crate wires it to HTTP, to the processors and to the
//! notification channels.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/create-invoice-btc`: Create a BTCPay invoice and a `processing` order.
//! * `/webhook`: BTCPay webhook receiver. Deliveries must carry a valid `BTCPay-Sig` header.
//! * `/create-payment-intent`: Create a Stripe payment intent.
//! * `/confirm-payment`: Confirm a card payment for a basket of products.
//! * `/confirm-payment-auction`: Confirm a card payment for a won auction.
//! * `/status/{order_id}`: The status of an order.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod notifications;
pub mod reconcile_worker;
pub mod routes;
pub mod server;
