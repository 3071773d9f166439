//! Publisher replenishment orders

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

#[derive(sqlx::FromRow, Serialize)]
pub struct PublisherOrderRow {
    pub order_id: i64,
    pub cost: Option<Decimal>,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub quantity: i32,
    pub isbn_number: String,
    pub book_title: String,
}

pub async fn list(pool: &PgPool) -> Result<Vec<PublisherOrderRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT po.order_id, po.cost, po.order_date, po.status, po.quantity,
                po.isbn_number, b.title AS book_title
         FROM publisher_order po
         JOIN book b ON b.isbn_number = po.isbn_number
         ORDER BY po.order_date DESC",
    )
    .fetch_all(pool)
    .await
}

/// Confirm a pending order. Returns false if the order is missing or
/// already confirmed.
pub async fn confirm(pool: &PgPool, order_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE publisher_order
         SET status = 'Confirmed'
         WHERE order_id = $1 AND status = 'Pending'",
    )
    .bind(order_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn replenishment_count(pool: &PgPool, isbn: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(order_id) FROM publisher_order WHERE isbn_number = $1")
        .bind(isbn)
        .fetch_one(pool)
        .await
}

/// Queue a replenishment order for a book whose stock fell below its
/// threshold, unless one is already pending. Runs inside the order
/// transaction.
pub async fn replenish_if_needed(
    conn: &mut PgConnection,
    isbn: &str,
    threshold: i32,
) -> Result<(), sqlx::Error> {
    if threshold <= 0 {
        return Ok(());
    }

    let pending: Option<i64> = sqlx::query_scalar(
        "SELECT order_id FROM publisher_order
         WHERE isbn_number = $1 AND status = 'Pending'
         LIMIT 1",
    )
    .bind(isbn)
    .fetch_optional(&mut *conn)
    .await?;
    if pending.is_some() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO publisher_order (isbn_number, publisher_id, quantity)
         SELECT isbn_number, publisher_id, $2 FROM book WHERE isbn_number = $1",
    )
    .bind(isbn)
    .bind(threshold * 2)
    .execute(conn)
    .await?;

    tracing::info!(isbn, quantity = threshold * 2, "replenishment order queued");
    Ok(())
}
