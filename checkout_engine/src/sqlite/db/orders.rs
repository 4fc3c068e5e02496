use chrono::Duration;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{LineItem, NewLineItem, NewOrder, Order, OrderId, OrderStatusType},
    traits::CheckoutDbError,
};

/// Inserts a new order and its line items using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// Returns [`CheckoutDbError::OrderAlreadyExists`] if the order id is already in use.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, CheckoutDbError> {
    if order_exists(&order.order_id, &mut *conn).await?.is_some() {
        return Err(CheckoutDbError::OrderAlreadyExists(order.order_id));
    }
    let NewOrder { order_id, payer_id, invoice_id, payment_intent_id, items, total_price, currency, processor, status } =
        order;
    let mut inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                payer_id,
                invoice_id,
                payment_intent_id,
                total_price,
                currency,
                processor,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(payer_id)
    .bind(invoice_id)
    .bind(payment_intent_id)
    .bind(total_price.to_string())
    .bind(currency)
    .bind(processor.to_string())
    .bind(status.to_string())
    .fetch_one(&mut *conn)
    .await?;
    insert_line_items(inserted.id, items, &mut *conn).await?;
    inserted.items = fetch_line_items(inserted.id, conn).await?;
    debug!("🗃️ Order [{}] inserted with id {} and {} items", inserted.order_id, inserted.id, inserted.items.len());
    Ok(inserted)
}

async fn insert_line_items(
    order_ref: i64,
    items: Vec<NewLineItem>,
    conn: &mut SqliteConnection,
) -> Result<(), CheckoutDbError> {
    if items.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("INSERT INTO order_items (order_ref, title, item_ref, kind, price, quantity) ");
    builder.push_values(items, |mut row, item| {
        row.push_bind(order_ref)
            .push_bind(item.title)
            .push_bind(item.item_ref)
            .push_bind(item.kind.to_string())
            .push_bind(item.price.to_string())
            .push_bind(i64::from(item.quantity));
    });
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build().execute(conn).await?;
    Ok(())
}

pub async fn fetch_line_items(order_ref: i64, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_ref = $1 ORDER BY id ASC").bind(order_ref).fetch_all(conn).await
}

async fn with_items(order: Option<Order>, conn: &mut SqliteConnection) -> Result<Option<Order>, CheckoutDbError> {
    match order {
        Some(mut order) => {
            order.items = fetch_line_items(order.id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// Checks whether the order with the given `OrderId` already exists in the database. If it does exist, the `id` of the
/// order is returned. If it does not exist, `None` is returned.
pub async fn order_exists(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<i64>, CheckoutDbError> {
    let id: Option<i64> = sqlx::query_scalar("SELECT id FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, CheckoutDbError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    with_items(order, conn).await
}

pub async fn fetch_order_by_invoice_id(
    invoice_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, CheckoutDbError> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE invoice_id = $1").bind(invoice_id).fetch_optional(&mut *conn).await?;
    with_items(order, conn).await
}

pub async fn fetch_order_by_payment_intent(
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, CheckoutDbError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_intent_id = $1")
        .bind(intent_id)
        .fetch_optional(&mut *conn)
        .await?;
    with_items(order, conn).await
}

/// Orders for the payer, in the order they were appended to the payer's order list.
pub async fn fetch_orders_for_payer(payer_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, CheckoutDbError> {
    let orders: Vec<Order> = sqlx::query_as(
        r#"
        SELECT orders.* FROM orders
        JOIN payer_orders ON payer_orders.order_id = orders.order_id
        WHERE payer_orders.payer_id = $1
        ORDER BY payer_orders.id ASC
        "#,
    )
    .bind(payer_id)
    .fetch_all(&mut *conn)
    .await?;
    let mut result = Vec::with_capacity(orders.len());
    for mut order in orders {
        order.items = fetch_line_items(order.id, &mut *conn).await?;
        result.push(order);
    }
    Ok(result)
}

/// Compare-and-swap on the order status. Returns `None` if the order is not currently in the `expected` state.
pub(crate) async fn update_order_status(
    id: i64,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, CheckoutDbError> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING *",
    )
    .bind(new_status.to_string())
    .bind(id)
    .bind(expected.to_string())
    .fetch_optional(&mut *conn)
    .await?;
    with_items(order, conn).await
}

pub(crate) async fn overwrite_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, CheckoutDbError> {
    let order = sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(status.to_string())
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    with_items(order, conn).await?.ok_or(CheckoutDbError::OrderIdNotFound(id))
}

/// Crypto orders still waiting on their invoice whose last update is older than `limit`.
pub(crate) async fn fetch_stale_invoice_orders(
    limit: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, CheckoutDbError> {
    let orders: Vec<Order> = sqlx::query_as(
        r#"
        SELECT * FROM orders
        WHERE status = 'processing' AND invoice_id IS NOT NULL AND
            (unixepoch(CURRENT_TIMESTAMP) - unixepoch(updated_at)) > $1
        ORDER BY updated_at ASC
        "#,
    )
    .bind(limit.num_seconds())
    .fetch_all(&mut *conn)
    .await?;
    let mut result = Vec::with_capacity(orders.len());
    for mut order in orders {
        order.items = fetch_line_items(order.id, &mut *conn).await?;
        result.push(order);
    }
    Ok(result)
}
