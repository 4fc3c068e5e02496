//! `SqliteDatabase` is a concrete implementation of a checkout engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{catalog, db_url, new_pool, orders, payers, run_migrations};
use crate::{
    db_types::{Auction, NewAuction, NewOrder, NewPayer, Order, OrderId, OrderStatusType, Payer, Product},
    traits::{CatalogManagement, CheckoutDatabase, CheckoutDbError, PayerManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl CheckoutDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, CheckoutDbError> {
        let mut tx = self.pool.begin().await?;
        if payers::fetch_payer(&order.payer_id, &mut tx).await?.is_none() {
            return Err(CheckoutDbError::PayerNotFound(order.payer_id));
        }
        let order = orders::insert_order(order, &mut tx).await?;
        payers::append_order_ref(&order.payer_id, &order.order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] saved for payer {}", order.order_id, order.payer_id);
        Ok(order)
    }

    async fn insert_auction_order(&self, order: NewOrder, auction_id: &str) -> Result<(Order, Auction), CheckoutDbError> {
        let mut tx = self.pool.begin().await?;
        if payers::fetch_payer(&order.payer_id, &mut tx).await?.is_none() {
            return Err(CheckoutDbError::PayerNotFound(order.payer_id));
        }
        let auction = match catalog::complete_auction(auction_id, &mut tx).await? {
            Some(a) => a,
            None => {
                let err = match catalog::fetch_auction(auction_id, &mut tx).await? {
                    Some(a) => CheckoutDbError::AuctionNotCompletable { id: a.id, status: a.status },
                    None => CheckoutDbError::AuctionNotFound(auction_id.to_string()),
                };
                return Err(err);
            },
        };
        let order = orders::insert_order(order, &mut tx).await?;
        payers::append_order_ref(&order.payer_id, &order.order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Auction {} closed by order [{}]", auction.id, order.order_id);
        Ok((order, auction))
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn fetch_order_by_invoice_id(&self, invoice_id: &str) -> Result<Option<Order>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_invoice_id(invoice_id, &mut conn).await
    }

    async fn fetch_order_by_payment_intent(&self, intent_id: &str) -> Result<Option<Order>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_payment_intent(intent_id, &mut conn).await
    }

    async fn update_order_status(
        &self,
        id: i64,
        expected: OrderStatusType,
        new_status: OrderStatusType,
    ) -> Result<Option<Order>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::update_order_status(id, expected, new_status, &mut conn).await?;
        match &result {
            Some(o) => debug!("🗃️ Order [{}] moved from {expected} to {new_status}", o.order_id),
            None => debug!("🗃️ Order #{id} was not {expected}. Status left unchanged"),
        }
        Ok(result)
    }

    async fn overwrite_order_status(&self, id: i64, status: OrderStatusType) -> Result<Order, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::overwrite_order_status(id, status, &mut conn).await?;
        debug!("🗃️ Order [{}] status overwritten with {status}", order.order_id);
        Ok(order)
    }

    async fn fetch_stale_invoice_orders(&self, older_than: Duration) -> Result<Vec<Order>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_stale_invoice_orders(older_than, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), CheckoutDbError> {
        self.pool.close().await;
        Ok(())
    }
}

impl PayerManagement for SqliteDatabase {
    async fn fetch_payer(&self, payer_id: &str) -> Result<Option<Payer>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        payers::fetch_payer(payer_id, &mut conn).await
    }

    async fn insert_payer(&self, payer: NewPayer) -> Result<Payer, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        payers::insert_payer(payer, &mut conn).await
    }

    async fn fetch_orders_for_payer(&self, payer_id: &str) -> Result<Vec<Order>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_payer(payer_id, &mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_auction(&self, auction_id: &str) -> Result<Option<Auction>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_auction(auction_id, &mut conn).await?)
    }

    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_auction(auction, &mut conn).await
    }

    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_product(product_id, &mut conn).await?)
    }

    async fn upsert_product(&self, product: Product) -> Result<Product, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::upsert_product(product, &mut conn).await?)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations.
    pub async fn run_migrations(&self) -> Result<(), CheckoutDbError> {
        run_migrations(&self.pool).await.map_err(|e| CheckoutDbError::MigrationError(e.to_string()))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}
