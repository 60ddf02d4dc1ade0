//! Query functions for the order tables. None of these are atomic on their own; callers compose them inside a
//! transaction and pass `&mut *tx` as the connection.
use log::*;
use sqlx::PgConnection;

use super::{PostgresDatabaseError, ReadStage, WriteStage};
use crate::{
    db_types::{Delivery, Item, Order, OrderUid, Payment},
    traits::InsertOrderResult,
};

/// Writes the full order aggregate using the given connection.
///
/// The order row is inserted only if it does not exist yet. When it already exists, its scalar fields are left as
/// they are, and the delivery, payment and item rows are replaced by those of `order`, so that re-processing the same
/// order never duplicates sub-rows.
pub async fn write_order(order: &Order, conn: &mut PgConnection) -> Result<InsertOrderResult, PostgresDatabaseError> {
    let uid = &order.order_uid;
    let result = if insert_order_row(order, conn).await? {
        InsertOrderResult::Inserted(uid.clone())
    } else {
        debug!("🗃️ Order {uid} already exists. Replacing its delivery, payment and item rows.");
        delete_sub_rows(uid, conn).await?;
        InsertOrderResult::AlreadyExists(uid.clone())
    };
    insert_delivery(uid, &order.delivery, conn).await?;
    insert_payment(uid, &order.payment, conn).await?;
    for item in &order.items {
        insert_item(uid, item, conn).await?;
    }
    trace!("🗃️ Order {uid} written with {} items", order.items.len());
    Ok(result)
}

/// Returns `true` if a new row was created, and `false` if an order with the same uid was already present.
async fn insert_order_row(order: &Order, conn: &mut PgConnection) -> Result<bool, PostgresDatabaseError> {
    let result = sqlx::query(
        r#"
            INSERT INTO orders (
                order_uid,
                track_number,
                entry,
                locale,
                internal_signature,
                customer_id,
                delivery_service,
                shard_key,
                sm_id,
                date_created,
                oof_shard
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (order_uid) DO NOTHING;
        "#,
    )
    .bind(&order.order_uid)
    .bind(&order.track_number)
    .bind(&order.entry)
    .bind(&order.locale)
    .bind(&order.internal_signature)
    .bind(&order.customer_id)
    .bind(&order.delivery_service)
    .bind(&order.shard_key)
    .bind(order.sm_id)
    .bind(order.date_created)
    .bind(&order.oof_shard)
    .execute(conn)
    .await
    .map_err(PostgresDatabaseError::write(&order.order_uid, WriteStage::Order))?;
    Ok(result.rows_affected() == 1)
}

async fn delete_sub_rows(uid: &OrderUid, conn: &mut PgConnection) -> Result<(), PostgresDatabaseError> {
    for table in ["deliveries", "payments", "items"] {
        let sql = format!("DELETE FROM {table} WHERE order_uid = $1");
        let result = sqlx::query(&sql)
            .bind(uid)
            .execute(&mut *conn)
            .await
            .map_err(PostgresDatabaseError::write(uid, WriteStage::ClearPrevious))?;
        trace!("🗃️ Removed {} rows from {table} for order {uid}", result.rows_affected());
    }
    Ok(())
}

async fn insert_delivery(
    uid: &OrderUid,
    delivery: &Delivery,
    conn: &mut PgConnection,
) -> Result<(), PostgresDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO deliveries (order_uid, name, phone, zip, city, address, region, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8);
        "#,
    )
    .bind(uid)
    .bind(&delivery.name)
    .bind(&delivery.phone)
    .bind(&delivery.zip)
    .bind(&delivery.city)
    .bind(&delivery.address)
    .bind(&delivery.region)
    .bind(&delivery.email)
    .execute(conn)
    .await
    .map_err(PostgresDatabaseError::write(uid, WriteStage::Delivery))?;
    Ok(())
}

async fn insert_payment(uid: &OrderUid, payment: &Payment, conn: &mut PgConnection) -> Result<(), PostgresDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO payments (
                order_uid,
                transaction,
                request_id,
                currency,
                provider,
                amount,
                payment_dt,
                bank,
                delivery_cost,
                goods_total,
                custom_fee
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11);
        "#,
    )
    .bind(uid)
    .bind(&payment.transaction)
    .bind(&payment.request_id)
    .bind(&payment.currency)
    .bind(&payment.provider)
    .bind(payment.amount)
    .bind(payment.payment_dt)
    .bind(&payment.bank)
    .bind(payment.delivery_cost)
    .bind(payment.goods_total)
    .bind(payment.custom_fee)
    .execute(conn)
    .await
    .map_err(PostgresDatabaseError::write(uid, WriteStage::Payment))?;
    Ok(())
}

async fn insert_item(uid: &OrderUid, item: &Item, conn: &mut PgConnection) -> Result<(), PostgresDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO items (
                order_uid,
                chrt_id,
                track_number,
                price,
                rid,
                name,
                sale,
                size,
                total_price,
                nm_id,
                brand,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12);
        "#,
    )
    .bind(uid)
    .bind(item.chrt_id)
    .bind(&item.track_number)
    .bind(item.price)
    .bind(&item.rid)
    .bind(&item.name)
    .bind(item.sale)
    .bind(&item.size)
    .bind(item.total_price)
    .bind(item.nm_id)
    .bind(&item.brand)
    .bind(item.status)
    .execute(conn)
    .await
    .map_err(PostgresDatabaseError::write(uid, WriteStage::Item))?;
    Ok(())
}

/// Reassembles the order aggregate. Returns `None` if there is no order row for `uid`.
///
/// Missing delivery or payment rows are tolerated and replaced with defaults. Items come back in insertion order.
pub async fn fetch_order(uid: &OrderUid, conn: &mut PgConnection) -> Result<Option<Order>, PostgresDatabaseError> {
    let Some(mut order) = fetch_order_row(uid, conn).await? else {
        return Ok(None);
    };
    order.delivery = fetch_delivery(uid, conn).await?.unwrap_or_else(|| {
        warn!("🗃️ Order {uid} has no delivery row");
        Delivery::default()
    });
    order.payment = fetch_payment(uid, conn).await?.unwrap_or_else(|| {
        warn!("🗃️ Order {uid} has no payment row");
        Payment::default()
    });
    order.items = fetch_items(uid, conn).await?;
    Ok(Some(order))
}

async fn fetch_order_row(uid: &OrderUid, conn: &mut PgConnection) -> Result<Option<Order>, PostgresDatabaseError> {
    sqlx::query_as::<_, Order>(
        r#"
            SELECT
                order_uid,
                track_number,
                entry,
                locale,
                internal_signature,
                customer_id,
                delivery_service,
                shard_key,
                sm_id,
                date_created,
                oof_shard
            FROM orders
            WHERE order_uid = $1;
        "#,
    )
    .bind(uid)
    .fetch_optional(conn)
    .await
    .map_err(PostgresDatabaseError::read(uid, ReadStage::Order))
}

pub async fn fetch_delivery(uid: &OrderUid, conn: &mut PgConnection) -> Result<Option<Delivery>, PostgresDatabaseError> {
    sqlx::query_as::<_, Delivery>(
        "SELECT name, phone, zip, city, address, region, email FROM deliveries WHERE order_uid = $1",
    )
    .bind(uid)
    .fetch_optional(conn)
    .await
    .map_err(PostgresDatabaseError::read(uid, ReadStage::Delivery))
}

pub async fn fetch_payment(uid: &OrderUid, conn: &mut PgConnection) -> Result<Option<Payment>, PostgresDatabaseError> {
    sqlx::query_as::<_, Payment>(
        r#"
            SELECT
                transaction,
                request_id,
                currency,
                provider,
                amount,
                payment_dt,
                bank,
                delivery_cost,
                goods_total,
                custom_fee
            FROM payments
            WHERE order_uid = $1;
        "#,
    )
    .bind(uid)
    .fetch_optional(conn)
    .await
    .map_err(PostgresDatabaseError::read(uid, ReadStage::Payment))
}

pub async fn fetch_items(uid: &OrderUid, conn: &mut PgConnection) -> Result<Vec<Item>, PostgresDatabaseError> {
    sqlx::query_as::<_, Item>(
        r#"
            SELECT
                chrt_id,
                track_number,
                price,
                rid,
                name,
                sale,
                size,
                total_price,
                nm_id,
                brand,
                status
            FROM items
            WHERE order_uid = $1
            ORDER BY id ASC;
        "#,
    )
    .bind(uid)
    .fetch_all(conn)
    .await
    .map_err(PostgresDatabaseError::read(uid, ReadStage::Items))
}

/// Counts the rows held for `uid` in each sub-entity table, as `(deliveries, payments, items)`.
pub async fn count_sub_rows(uid: &OrderUid, conn: &mut PgConnection) -> Result<(i64, i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64, i64)>(
        r#"
            SELECT
                (SELECT COUNT(*) FROM deliveries WHERE order_uid = $1),
                (SELECT COUNT(*) FROM payments WHERE order_uid = $1),
                (SELECT COUNT(*) FROM items WHERE order_uid = $1);
        "#,
    )
    .bind(uid)
    .fetch_one(conn)
    .await
}
