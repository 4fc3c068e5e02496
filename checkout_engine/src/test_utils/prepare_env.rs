use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{Auction, AuctionStatus, NewAuction, NewPayer, Payer, Product},
    CatalogManagement,
    CheckoutDatabase,
    PayerManagement,
    SqliteDatabase,
};

/// Creates a fresh database at `url`, applies the migrations, and returns a connection to it.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/checkout_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

pub async fn tear_down(db: SqliteDatabase) {
    let url = db.url().to_string();
    db.pool().close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("Failed to drop test database {url}: {e}");
    }
}

pub async fn seed_payer(db: &SqliteDatabase, id: &str) -> Payer {
    let payer = NewPayer::new(id, format!("{id}@example.com").as_str()).with_name(format!("{id} Tester"));
    db.insert_payer(payer).await.expect("Error inserting payer")
}

pub async fn seed_auction(db: &SqliteDatabase, id: &str, price: &str, status: AuctionStatus) -> Auction {
    let mut auction = NewAuction::new(id, "Signed first edition", price.parse().expect("Invalid price"));
    auction.status = status;
    db.insert_auction(auction).await.expect("Error inserting auction")
}

pub async fn seed_product(db: &SqliteDatabase, id: &str, price: &str) -> Product {
    let product = Product::new(id, format!("Product {id}").as_str(), price.parse().expect("Invalid price"));
    db.upsert_product(product).await.expect("Error inserting product")
}
