use crate::{
    db_types::{NewPayer, Order, Payer},
    traits::CheckoutDbError,
};

/// Access to payers (the users that own orders).
#[allow(async_fn_in_trait)]
pub trait PayerManagement {
    /// Fetches the payer with the given id, including the ordered list of order references.
    async fn fetch_payer(&self, payer_id: &str) -> Result<Option<Payer>, CheckoutDbError>;

    /// Creates a new payer record. Returns [`CheckoutDbError::PayerAlreadyExists`] if the id is taken.
    async fn insert_payer(&self, payer: NewPayer) -> Result<Payer, CheckoutDbError>;

    /// Fetches the full orders for the payer, oldest first.
    async fn fetch_orders_for_payer(&self, payer_id: &str) -> Result<Vec<Order>, CheckoutDbError>;
}
