use crate::{
    db_types::{Auction, NewAuction, Product},
    traits::CheckoutDbError,
};

#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_auction(&self, auction_id: &str) -> Result<Option<Auction>, CheckoutDbError>;

    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, CheckoutDbError>;

    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, CheckoutDbError>;

    /// Inserts the product, or updates the title and price if it already exists.
    async fn upsert_product(&self, product: Product) -> Result<Product, CheckoutDbError>;
}
