use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{Auction, AuctionStatus, NewOrder, Order, OrderId, OrderStatusType},
    traits::{CatalogManagement, PayerManagement},
};

/// This trait defines the highest level of behaviour for backends supporting the checkout engine.
///
/// This behaviour includes:
/// * Atomically storing new orders along with their line items and the payer's order reference.
/// * Atomically closing an auction and storing the order that paid for it.
/// * Looking orders up by any of the identifiers that processors hand back to us.
/// * Guarded (compare-and-swap) status transitions.
#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase: Clone + PayerManagement + CatalogManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order, its line items and appends the order to the payer's order list, in a single atomic
    /// transaction.
    ///
    /// If an order with the same `order_id` already exists, [`CheckoutDbError::OrderAlreadyExists`] is returned and
    /// nothing is written.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, CheckoutDbError>;

    /// In a single atomic transaction,
    /// * marks the auction as `Completed`. This only succeeds if the auction is still payable (`Active` or `Ended`).
    /// * stores the order as per [`Self::insert_order`].
    ///
    /// If the auction has already been completed (or canceled), [`CheckoutDbError::AuctionNotCompletable`] is
    /// returned and nothing is written.
    async fn insert_auction_order(&self, order: NewOrder, auction_id: &str) -> Result<(Order, Auction), CheckoutDbError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, CheckoutDbError>;

    async fn fetch_order_by_invoice_id(&self, invoice_id: &str) -> Result<Option<Order>, CheckoutDbError>;

    async fn fetch_order_by_payment_intent(&self, intent_id: &str) -> Result<Option<Order>, CheckoutDbError>;

    /// Changes the order status to `new_status`, but only if the order's current status is `expected`.
    ///
    /// Returns the updated order, or `None` if the order was not in the expected state (including the case where the
    /// order does not exist).
    async fn update_order_status(
        &self,
        id: i64,
        expected: OrderStatusType,
        new_status: OrderStatusType,
    ) -> Result<Option<Order>, CheckoutDbError>;

    /// Sets the order status unconditionally. This bypasses the monotonic transition rules and is only used when the
    /// engine is explicitly configured for lenient transitions.
    async fn overwrite_order_status(&self, id: i64, status: OrderStatusType) -> Result<Order, CheckoutDbError>;

    /// Fetches crypto orders that are still `Processing` and have not been touched for longer than `older_than`.
    async fn fetch_stale_invoice_orders(&self, older_than: Duration) -> Result<Vec<Order>, CheckoutDbError>;

    /// Closes the database connection pool.
    async fn close(&mut self) -> Result<(), CheckoutDbError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutDbError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists: {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("The requested payer {0} does not exist")]
    PayerNotFound(String),
    #[error("Cannot insert payer, since it already exists: {0}")]
    PayerAlreadyExists(String),
    #[error("The requested auction {0} does not exist")]
    AuctionNotFound(String),
    #[error("Auction {id} cannot be completed since it is already {status}")]
    AuctionNotCompletable { id: String, status: AuctionStatus },
    #[error("Could not apply database migrations. {0}")]
    MigrationError(String),
}

impl From<sqlx::Error> for CheckoutDbError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutDbError::DatabaseError(e.to_string())
    }
}
