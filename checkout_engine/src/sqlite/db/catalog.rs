use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Auction, NewAuction, Product},
    traits::CheckoutDbError,
};

pub async fn fetch_auction(auction_id: &str, conn: &mut SqliteConnection) -> Result<Option<Auction>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM auctions WHERE id = $1").bind(auction_id).fetch_optional(conn).await
}

pub async fn insert_auction(auction: NewAuction, conn: &mut SqliteConnection) -> Result<Auction, CheckoutDbError> {
    let auction = sqlx::query_as("INSERT INTO auctions (id, title, current_price, status) VALUES ($1, $2, $3, $4) RETURNING *")
        .bind(auction.id)
        .bind(auction.title)
        .bind(auction.current_price.to_string())
        .bind(auction.status.to_string())
        .fetch_one(conn)
        .await?;
    Ok(auction)
}

/// Moves a payable (`active` or `ended`) auction to `completed`. Returns `None` if the auction does not exist or is
/// not payable, so at most one caller can ever complete a given auction.
pub async fn complete_auction(auction_id: &str, conn: &mut SqliteConnection) -> Result<Option<Auction>, sqlx::Error> {
    let auction: Option<Auction> = sqlx::query_as(
        r#"
        UPDATE auctions SET status = 'completed', updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND status IN ('active', 'ended')
        RETURNING *
        "#,
    )
    .bind(auction_id)
    .fetch_optional(conn)
    .await?;
    if let Some(a) = &auction {
        debug!("🗃️ Auction {} marked as completed", a.id);
    }
    Ok(auction)
}

pub async fn fetch_product(product_id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT id, title, price FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await
}

pub async fn upsert_product(product: Product, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO products (id, title, price) VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET title = excluded.title, price = excluded.price, updated_at = CURRENT_TIMESTAMP
        RETURNING id, title, price
        "#,
    )
    .bind(product.id)
    .bind(product.title)
    .bind(product.price.to_string())
    .fetch_one(conn)
    .await
}
