use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayer, OrderId, Payer},
    traits::CheckoutDbError,
};

pub async fn fetch_payer(payer_id: &str, conn: &mut SqliteConnection) -> Result<Option<Payer>, CheckoutDbError> {
    let payer: Option<Payer> =
        sqlx::query_as("SELECT * FROM payers WHERE id = $1").bind(payer_id).fetch_optional(&mut *conn).await?;
    match payer {
        Some(mut payer) => {
            payer.orders = fetch_order_refs(&payer.id, conn).await?;
            Ok(Some(payer))
        },
        None => Ok(None),
    }
}

pub async fn fetch_order_refs(payer_id: &str, conn: &mut SqliteConnection) -> Result<Vec<OrderId>, sqlx::Error> {
    let refs: Vec<String> = sqlx::query_scalar("SELECT order_id FROM payer_orders WHERE payer_id = $1 ORDER BY id ASC")
        .bind(payer_id)
        .fetch_all(conn)
        .await?;
    Ok(refs.into_iter().map(OrderId::from).collect())
}

pub async fn insert_payer(payer: NewPayer, conn: &mut SqliteConnection) -> Result<Payer, CheckoutDbError> {
    let exists: Option<String> =
        sqlx::query_scalar("SELECT id FROM payers WHERE id = $1").bind(&payer.id).fetch_optional(&mut *conn).await?;
    if exists.is_some() {
        return Err(CheckoutDbError::PayerAlreadyExists(payer.id));
    }
    let payer: Payer = sqlx::query_as("INSERT INTO payers (id, email, name) VALUES ($1, $2, $3) RETURNING *")
        .bind(payer.id)
        .bind(payer.email)
        .bind(payer.name)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Payer {} created", payer.id);
    Ok(payer)
}

/// Appends `order_id` to the end of the payer's order list.
pub async fn append_order_ref(
    payer_id: &str,
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<(), CheckoutDbError> {
    let result = sqlx::query("INSERT INTO payer_orders (payer_id, order_id) VALUES ($1, $2)")
        .bind(payer_id)
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    if result.rows_affected() != 1 {
        return Err(CheckoutDbError::DatabaseError(format!(
            "Could not link order {order_id} to payer {payer_id}"
        )));
    }
    Ok(())
}
